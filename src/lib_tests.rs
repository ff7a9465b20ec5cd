use super::*;

#[test]
fn error_and_result_are_reexported() {
    fn fails() -> Result<()> {
        Err(FileGroupsError::Config("nope".to_string()))
    }
    assert!(fails().is_err());
}

#[test]
fn default_handler_options_are_safe() {
    let options = HandlerOptions::default();
    assert!(options.dry_run);
    assert!(!options.delete_symlinks_instead_of_relinking);
    assert!(options.protected_regexes.is_empty());
}

#[test]
fn counters_start_at_zero() {
    let counters = OpCounters::default();
    assert_eq!(counters.num_deleted, 0);
    assert_eq!(counters.num_renamed, 0);
    assert_eq!(counters.num_moved, 0);
    assert_eq!(counters.num_symlinks_relinked, 0);
    assert_eq!(counters.num_symlinks_deleted, 0);
    assert_eq!(counters.num_symlinks_dangling, 0);
}
