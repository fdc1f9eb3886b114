mod common;

use common::*;

use http::StatusCode;

#[tokio::test]
async fn test_delete_happy_path() {
    let (setup, backend) = TestSetup::new().await;
    setup.upload("cat.png", b"meow").await;

    let response = setup.delete("1").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert!(setup.image_ids().await.is_empty());
    assert_eq!(backend.removed(), vec!["cat.png"]);
}

#[tokio::test]
async fn test_delete_only_removes_target() {
    let (setup, _backend) = TestSetup::new().await;
    for name in ["a.png", "b.png", "c.png"] {
        setup.upload(name, b"x").await;
    }

    setup.delete("2").await;

    assert_eq!(setup.image_ids().await, vec![3, 1]);
}

#[tokio::test]
async fn test_delete_wrong_secret_is_forbidden() {
    let (setup, backend) = TestSetup::new().await;
    setup.upload("cat.png", b"meow").await;

    let response = setup.send_form_request("/d", "secret=nope&id=1").await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(setup.image_ids().await, vec![1]);
    assert!(backend.removed().is_empty());
}

#[tokio::test]
async fn test_delete_missing_secret_is_forbidden() {
    let (setup, _backend) = TestSetup::new().await;
    setup.upload("cat.png", b"meow").await;

    let response = setup.send_form_request("/d", "id=1").await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(setup.image_ids().await, vec![1]);
}

#[tokio::test]
async fn test_delete_unknown_id_redirects_home() {
    let (setup, backend) = TestSetup::new().await;
    setup.upload("cat.png", b"meow").await;

    for id in ["42", "abc", ""] {
        let response = setup.delete(id).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER, "id {id:?}");
        assert_eq!(location(&response), "/");
    }

    assert_eq!(setup.image_ids().await, vec![1]);
    assert!(backend.removed().is_empty());
}

#[tokio::test]
async fn test_delete_twice_is_a_no_op() {
    let (setup, backend) = TestSetup::new().await;
    setup.upload("cat.png", b"meow").await;

    setup.delete("1").await;
    let response = setup.delete("1").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(backend.removed(), vec!["cat.png"]);
}

#[tokio::test]
async fn test_delete_keeps_file_shared_with_another_row() {
    let (setup, backend) = TestSetup::new().await;
    setup.upload("cat.png", b"first").await;
    setup.upload("cat.png", b"second").await;

    setup.delete("1").await;
    assert!(backend.removed().is_empty());
    assert_eq!(setup.image_ids().await, vec![2]);

    setup.delete("2").await;
    assert_eq!(backend.removed(), vec!["cat.png"]);
}

#[tokio::test]
async fn test_delete_remove_failure_still_deletes_row() {
    let (setup, backend) = TestSetup::new().await;
    setup.upload("cat.png", b"meow").await;
    backend.fail_remove();

    let response = setup.delete("1").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(setup.image_ids().await.is_empty());
}

#[tokio::test]
async fn test_deleted_image_permalink_shows_empty_state() {
    let (setup, _backend) = TestSetup::new().await;
    setup.upload("cat.png", b"meow").await;
    setup.delete("1").await;

    let response = setup.send_get_request("/u/1").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("No such image."));
    assert!(!body.contains("cat.png"));
}
