use std::sync::Mutex;
use tracing::info;

/// Administrative battery-malfunction flag, toggled by hand.
#[derive(Debug, Default)]
pub struct MalfunctionFlag {
    active: Mutex<bool>,
}

impl MalfunctionFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_active(&self, active: bool) {
        let mut cur = crate::lock(&self.active);
        if *cur != active {
            info!("malfunction flag: {} -> {}", *cur, active);
        }
        *cur = active;
    }

    pub fn is_active(&self) -> bool {
        *crate::lock(&self.active)
    }
}
