use super::*;

#[test]
fn test_extract_error_keeps_archive_name() {
    let err = ExtractError::Corrupt {
        archive: "broken.zip".to_string(),
        message: "invalid Zip archive".to_string(),
    };

    assert_eq!(err.archive(), "broken.zip");
    assert_eq!(
        err.to_string(),
        "Invalid or corrupt archive broken.zip: invalid Zip archive"
    );
}

#[test]
fn test_patch_error_exit_status_message() {
    let err = PatchError::ExitStatus {
        package: "HighResMenus".to_string(),
        code: Some(3),
    };
    assert_eq!(err.package(), "HighResMenus");
    assert_eq!(err.to_string(), "HighResMenus: patcher exited with code 3");

    let killed = PatchError::ExitStatus {
        package: "HighResMenus".to_string(),
        code: None,
    };
    assert!(killed.to_string().ends_with("a signal"));
}

#[test]
fn test_patch_error_timeout_message() {
    let err = PatchError::TimedOut {
        package: "Robes".to_string(),
        secs: 600,
    };

    assert_eq!(err.package(), "Robes");
    assert_eq!(
        err.to_string(),
        "Robes: patcher did not finish within 600s and was killed"
    );
}

#[test]
fn test_install_error_from_fatal_copy() {
    let copy_err = FatalCopyError {
        from: PathBuf::from("a/b.txt"),
        to: PathBuf::from("out/b.txt"),
        source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
    };
    let err = InstallError::from(copy_err);

    match err {
        InstallError::FatalCopy(inner) => assert_eq!(inner.to, PathBuf::from("out/b.txt")),
        _ => panic!("Expected InstallError::FatalCopy"),
    }
}

#[test]
fn test_errors_serialize_as_display_string() {
    let err = ExtractError::Unsupported {
        archive: "mod.tar".to_string(),
    };

    let serialized = serde_json::to_string(&err).unwrap();
    assert_eq!(serialized, "\"Unsupported archive format: mod.tar\"");
}
