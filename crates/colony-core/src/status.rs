#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Result of stepping an act once.
///
/// `Running` means "step me again next tick". `Success` and `Fail` are terminal: the act is done
/// and will not make further progress until it is initialized again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Status {
    Running,
    Success,
    Fail,
}

impl Status {
    #[inline]
    pub fn is_running(self) -> bool {
        matches!(self, Status::Running)
    }

    #[inline]
    pub fn is_success(self) -> bool {
        matches!(self, Status::Success)
    }

    #[inline]
    pub fn is_fail(self) -> bool {
        matches!(self, Status::Fail)
    }

    /// `true` for `Success` and `Fail`.
    #[inline]
    pub fn is_terminal(self) -> bool {
        !self.is_running()
    }

    /// Swap `Success` and `Fail`; `Running` is unchanged.
    #[inline]
    pub fn invert(self) -> Self {
        match self {
            Status::Running => Status::Running,
            Status::Success => Status::Fail,
            Status::Fail => Status::Success,
        }
    }

    pub fn from_bool(value: bool) -> Self {
        if value {
            Status::Success
        } else {
            Status::Fail
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invert_keeps_running() {
        assert_eq!(Status::Running.invert(), Status::Running);
        assert_eq!(Status::Success.invert(), Status::Fail);
        assert_eq!(Status::Fail.invert(), Status::Success);
    }

    #[test]
    fn terminal_statuses() {
        assert!(!Status::Running.is_terminal());
        assert!(Status::Success.is_terminal());
        assert!(Status::Fail.is_terminal());
        assert_eq!(Status::from_bool(true), Status::Success);
        assert_eq!(Status::from_bool(false), Status::Fail);
    }
}
