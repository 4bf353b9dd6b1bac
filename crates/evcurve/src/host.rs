use std::cell::Cell;
use std::rc::Rc;

/// Reports whether the host is in a window where renderer resources must not be touched,
/// such as while scripts are recompiling.
pub trait HostProbe {
    fn is_unsafe(&self) -> bool;
}

impl<T: HostProbe + ?Sized> HostProbe for &T {
    fn is_unsafe(&self) -> bool {
        (**self).is_unsafe()
    }
}

/// Probe for hosts that never rebuild their pipeline underneath us.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverUnsafe;

impl HostProbe for NeverUnsafe {
    fn is_unsafe(&self) -> bool {
        false
    }
}

/// Shared flag toggled by the host driver; clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct HostFlag {
    unsafe_state: Rc<Cell<bool>>,
}

impl HostFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unsafe(&self, value: bool) {
        self.unsafe_state.set(value);
    }

    pub fn begin_recompile(&self) {
        self.set_unsafe(true);
    }

    pub fn end_recompile(&self) {
        self.set_unsafe(false);
    }
}

impl HostProbe for HostFlag {
    fn is_unsafe(&self) -> bool {
        self.unsafe_state.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let flag = HostFlag::new();
        let observer = flag.clone();
        assert!(!observer.is_unsafe());
        flag.begin_recompile();
        assert!(observer.is_unsafe());
        flag.end_recompile();
        assert!(!observer.is_unsafe());
    }
}
