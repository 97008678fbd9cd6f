//! Authorization levels and the static operation table.

use std::fmt;

/// Ordered authorization levels. Each level includes everything below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PermissionLevel {
    ReadOnly = 0,
    Standard = 1,
    Advanced = 2,
    Admin = 3,
}

impl PermissionLevel {
    /// Map a configured numeric level (0–3) to a level.
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::ReadOnly),
            1 => Some(Self::Standard),
            2 => Some(Self::Advanced),
            3 => Some(Self::Admin),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::ReadOnly => "read-only",
            Self::Standard => "standard",
            Self::Advanced => "advanced",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Static declaration for one named operation.
#[derive(Debug, Clone, Copy)]
pub struct OperationSpec {
    /// Minimum level required to execute.
    pub min_level: PermissionLevel,
    /// Capable of destroying or relocating destination data; requires
    /// interactive confirmation when confirmation is enabled.
    pub dangerous: bool,
    /// Whether a dangerous operation can be undone within the window.
    pub reversible: bool,
}

const fn read_op() -> OperationSpec {
    OperationSpec {
        min_level: PermissionLevel::ReadOnly,
        dangerous: false,
        reversible: false,
    }
}

const fn standard_op() -> OperationSpec {
    OperationSpec {
        min_level: PermissionLevel::Standard,
        dangerous: false,
        reversible: false,
    }
}

const fn advanced_op(dangerous: bool, reversible: bool) -> OperationSpec {
    OperationSpec {
        min_level: PermissionLevel::Advanced,
        dangerous,
        reversible,
    }
}

/// Every operation the guard knows about. Anything absent from this table
/// is denied outright.
const OPERATIONS: &[(&str, OperationSpec)] = &[
    // Read
    ("search", read_op()),
    ("fetch_page", read_op()),
    ("fetch_children", read_op()),
    ("fetch_database", read_op()),
    ("query_database", read_op()),
    // Standard
    ("create_page", standard_op()),
    ("update_page", standard_op()),
    ("append_children", standard_op()),
    // Advanced
    ("move_page", advanced_op(false, false)),
    ("duplicate_page", advanced_op(false, false)),
    ("archive_page", advanced_op(true, true)),
    ("restore_page", advanced_op(false, false)),
    ("delete_block", advanced_op(true, false)),
];

/// Look up an operation's declared spec. `None` means fail-closed denial.
pub fn operation_spec(name: &str) -> Option<&'static OperationSpec> {
    OPERATIONS
        .iter()
        .find(|(op, _)| *op == name)
        .map(|(_, spec)| spec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_ordered() {
        assert!(PermissionLevel::ReadOnly < PermissionLevel::Standard);
        assert!(PermissionLevel::Standard < PermissionLevel::Advanced);
        assert!(PermissionLevel::Advanced < PermissionLevel::Admin);
    }

    #[test]
    fn index_mapping() {
        assert_eq!(PermissionLevel::from_index(0), Some(PermissionLevel::ReadOnly));
        assert_eq!(PermissionLevel::from_index(3), Some(PermissionLevel::Admin));
        assert_eq!(PermissionLevel::from_index(4), None);
    }

    #[test]
    fn declared_operations_resolve() {
        assert_eq!(
            operation_spec("search").unwrap().min_level,
            PermissionLevel::ReadOnly
        );
        assert_eq!(
            operation_spec("create_page").unwrap().min_level,
            PermissionLevel::Standard
        );

        let archive = operation_spec("archive_page").unwrap();
        assert!(archive.dangerous);
        assert!(archive.reversible);

        let delete = operation_spec("delete_block").unwrap();
        assert!(delete.dangerous);
        assert!(!delete.reversible);
    }

    #[test]
    fn undeclared_operations_are_unknown() {
        assert!(operation_spec("drop_workspace").is_none());
        assert!(operation_spec("").is_none());
    }
}
