use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        SlideError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(SlideError::render("x").to_string().contains("render error:"));
    assert!(
        SlideError::resource("x")
            .to_string()
            .contains("resource error:")
    );
    assert!(
        SlideError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = SlideError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn io_errors_convert() {
    fn open_missing() -> SlideResult<()> {
        std::fs::read("/definitely/not/here/slide.png")?;
        Ok(())
    }
    let err = open_missing().unwrap_err();
    assert!(matches!(err, SlideError::Io(_)));
    assert!(err.to_string().starts_with("io error:"));
}
