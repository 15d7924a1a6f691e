use axum::{
    body::to_bytes,
    http::{HeaderName, StatusCode, header},
};
use serde_json::json;

use kawaii_crop::response::{
    Composite, CompositeError, FileResponse, JsonResponse, ResponseError, ResponsePartExt,
    ResponseSequence, render,
};

#[tokio::test]
async fn file_then_json_body_are_written_in_order() {
    let composite = FileResponse::new(b"FILE".to_vec(), "application/octet-stream")
        .combine_with(JsonResponse::body(json!({"ok": true})));
    let resp = render(&composite).await.expect("render composite");

    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    assert_eq!(&bytes[..], br#"FILE{"ok":true}"#);
}

#[tokio::test]
async fn json_in_header_leaves_file_body_intact() {
    let name = HeaderName::from_static("x-result");
    let composite = FileResponse::new(vec![9u8; 16], "image/jpeg")
        .with_file_name("out.jpg")
        .combine_with(JsonResponse::in_header(name.clone(), json!({"Message": "done"})));
    let resp = render(&composite).await.expect("render composite");

    assert_eq!(resp.headers()[header::CONTENT_TYPE], "image/jpeg");
    assert_eq!(resp.headers()[&name], r#"{"Message":"done"}"#);
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    assert_eq!(bytes.len(), 16);
}

#[tokio::test]
async fn failing_step_aborts_the_sequence() {
    let sequence = ResponseSequence::new()
        .then(JsonResponse::body(json!(1)))
        .then(FileResponse::new(vec![0u8], "bad\ncontent-type"))
        .then(JsonResponse::body(json!(2)));
    assert_eq!(sequence.len(), 3);

    let Err(err) = render(&sequence).await else {
        panic!("second step must fail");
    };
    match err {
        ResponseError::Step { index, source } => {
            assert_eq!(index, 1);
            assert!(matches!(*source, ResponseError::InvalidHeader { .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn composite_requires_both_parts() {
    let missing = Composite::<FileResponse, JsonResponse<u8>>::try_new(
        Some(FileResponse::new(Vec::<u8>::new(), "image/jpeg")),
        None,
    );
    assert!(matches!(missing, Err(CompositeError::MissingPart { .. })));

    let ok = Composite::try_new(
        Some(FileResponse::new(Vec::<u8>::new(), "image/jpeg")),
        Some(JsonResponse::body(1u8)),
    );
    assert!(ok.is_ok());
}
