use super::*;
use crate::render::rasterizer::{CompositingRasterizer, Rasterizer};
use crate::render::surface::capture_tree;

const DOC: &str = r#"{
    "id": "post-42",
    "width": 8,
    "height": 4,
    "background": {"r": 10, "g": 20, "b": 30, "a": 255},
    "corner_radius": 2,
    "nodes": [
        {"kind": "fill", "frame": {"x": 0, "y": 0, "width": 4, "height": 4},
         "color": {"r": 255, "g": 0, "b": 0, "a": 255},
         "children": [
            {"kind": "image", "frame": {"x": 1, "y": 1, "width": 2, "height": 2},
             "url": "https://example.com/a.png"}
         ]},
        {"kind": "image", "frame": {"x": 4, "y": 0, "width": 4, "height": 4},
         "url": "https://example.com/b.png", "size": {"width": 4, "height": 4}},
        {"kind": "blur", "frame": {"x": 0, "y": 0, "width": 8, "height": 4}, "sigma": 0.0}
    ]
}"#;

#[test]
fn parses_and_assigns_displayers_in_preorder() {
    let doc = SurfaceDoc::from_json_str(DOC).unwrap();
    assert_eq!(doc.variant, "default");
    let map = doc.resources();
    let urls: Vec<_> = map
        .iter()
        .map(|e| (e.displayer, e.resource.url.as_str().to_owned()))
        .collect();
    assert_eq!(
        urls,
        vec![
            (DisplayerId(0), "https://example.com/a.png".to_owned()),
            (DisplayerId(1), "https://example.com/b.png".to_owned()),
        ]
    );
    assert_eq!(map.iter().nth(1).unwrap().resource.size, Some(ImageSize::new(4, 4)));
}

#[test]
fn rejects_invalid_documents() {
    assert!(SurfaceDoc::from_json_str("{").is_err());
    assert!(SurfaceDoc::from_json_str(r#"{"id": "x", "width": 0, "height": 1}"#).is_err());
    assert!(SurfaceDoc::from_json_str(r#"{"id": " ", "width": 1, "height": 1}"#).is_err());
    assert!(
        SurfaceDoc::from_json_str(
            r#"{"id": "x", "width": 1, "height": 1, "nodes": [
                {"kind": "blur", "frame": {"x": 0, "y": 0, "width": 1, "height": 1}, "sigma": -1}
            ]}"#
        )
        .is_err()
    );
    assert!(
        SurfaceDoc::from_json_str(r#"{"id": "x", "width": 1, "height": 1, "extra": true}"#)
            .is_err()
    );
}

#[test]
fn oversized_documents_are_rejected_before_allocating() {
    let huge_surface = r#"{"id": "x", "width": 100000, "height": 100000}"#;
    assert!(matches!(
        SurfaceDoc::from_json_str(huge_surface),
        Err(SlideError::Validation(_))
    ));

    let huge_node = r#"{"id": "x", "width": 4, "height": 4, "nodes": [
        {"kind": "fill", "frame": {"x": 0, "y": 0, "width": 9000, "height": 1},
         "color": {"r": 0, "g": 0, "b": 0, "a": 255}}
    ]}"#;
    assert!(SurfaceDoc::from_json_str(huge_node).is_err());

    let huge_image = r#"{"id": "x", "width": 4, "height": 4, "nodes": [
        {"kind": "image", "frame": {"x": 0, "y": 0, "width": 4, "height": 4},
         "url": "https://example.com/a.png", "size": {"width": 20000, "height": 4}}
    ]}"#;
    assert!(SurfaceDoc::from_json_str(huge_image).is_err());

    let at_limit = format!(r#"{{"id": "x", "width": {MAX_SURFACE_EXTENT}, "height": 1}}"#);
    assert!(SurfaceDoc::from_json_str(&at_limit).is_ok());
}

#[test]
fn displayer_images_flow_into_rendered_nodes() {
    let doc = SurfaceDoc::from_json_str(DOC).unwrap();
    let mut surface = DocSurface::new(doc);
    surface.set_displayer_image(DisplayerId(0), Some(Bitmap::solid(2, 2, Rgba8::opaque(0, 0, 255))));

    let bmp = CompositingRasterizer.rasterize(capture_tree(&surface)).unwrap();
    assert_eq!(bmp.width(), 8);
    assert_eq!(bmp.pixel(0, 0), Some(Rgba8::opaque(255, 0, 0)));
    // Child image sits at fill origin + (1, 1).
    assert_eq!(bmp.pixel(1, 1), Some(Rgba8::opaque(0, 0, 255)));
    // Displayer 1 has no image yet, so the background shows.
    assert_eq!(bmp.pixel(6, 2), Some(Rgba8::opaque(10, 20, 30)));

    surface.set_displayer_image(DisplayerId(0), None);
    assert!(surface.displayer_image(DisplayerId(0)).is_none());
}

#[test]
fn presentations_update_the_snapshot() {
    let mut surface = DocSurface::new(SurfaceDoc::from_json_str(DOC).unwrap());
    let a = Bitmap::solid(1, 1, Rgba8::opaque(1, 1, 1));
    surface.present(Presentation::CrossFade {
        to: a.clone(),
        duration: std::time::Duration::from_millis(10),
    });
    assert!(surface.snapshot().is_some_and(|s| s.ptr_eq(&a)));
    surface.present(Presentation::Immediate(None));
    assert!(surface.snapshot().is_none());
}
