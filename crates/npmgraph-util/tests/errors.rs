use npmgraph_util::errors::GraphError;

#[test]
fn test_io_error_display() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
    let err = GraphError::from(io_err);
    assert!(err.to_string().contains("I/O error"), "got: {err}");
}

#[test]
fn test_config_error_display() {
    let err = GraphError::Config {
        message: "bad syntax".to_string(),
    };
    assert_eq!(err.to_string(), "Config error: bad syntax");
}

#[test]
fn test_registry_error_display() {
    let err = GraphError::Registry {
        message: "no version of left-pad matches ^9".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Registry error: no version of left-pad matches ^9"
    );
}

#[test]
fn test_resolution_error_display() {
    let err = GraphError::Resolution {
        message: "no roots".to_string(),
    };
    assert_eq!(err.to_string(), "Dependency resolution failed: no roots");
}

#[test]
fn test_network_error_display() {
    let err = GraphError::Network {
        message: "timeout".to_string(),
    };
    assert_eq!(err.to_string(), "Network error: timeout");
}

#[test]
fn test_generic_error_display() {
    let err = GraphError::Generic {
        message: "something broke".to_string(),
    };
    assert_eq!(err.to_string(), "something broke");
}

#[test]
fn test_io_error_from_conversion() {
    let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let graph_err: GraphError = io_err.into();
    assert!(matches!(graph_err, GraphError::Io(_)));
}
