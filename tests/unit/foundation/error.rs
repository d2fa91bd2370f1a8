use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        WeaveError::invalid_argument("x")
            .to_string()
            .contains("invalid argument:")
    );
    assert!(
        WeaveError::animation("x")
            .to_string()
            .contains("animation error:")
    );
    assert!(WeaveError::render("x").to_string().contains("render error:"));
    assert!(
        WeaveError::assembly("x")
            .to_string()
            .contains("assembly failure:")
    );
    assert!(
        WeaveError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn encoding_failure_names_the_segment() {
    let err = WeaveError::encoding(7, "exit status 1");
    let msg = err.to_string();
    assert!(msg.contains("segment 7"));
    assert!(msg.contains("exit status 1"));
}

#[test]
fn early_termination_is_not_a_failure_variant() {
    assert!(WeaveError::EarlyTermination.is_early_termination());
    assert!(!WeaveError::render("x").is_early_termination());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = WeaveError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
