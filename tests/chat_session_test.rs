use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use biolens::session::{ChatSession, Sender, DATA_ANALYSIS_PROMPT, IMAGE_ANALYSIS_PROMPT};
use biolens::upload::{UploadClient, UploadInput};
use biolens::vision::VisionClient;

fn session_against(server: &MockServer) -> ChatSession {
    ChatSession::new(
        UploadClient::new(server.uri()),
        VisionClient::new(server.uri()),
    )
}

fn completion(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }],
    }))
}

fn png_input() -> UploadInput {
    UploadInput::File {
        filename: "slide.png".to_string(),
        bytes: b"fake png".to_vec(),
    }
}

#[tokio::test]
async fn image_upload_analyzes_and_extends_the_transcript() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "url": "/files/slide.png" })))
        .expect(1)
        .mount(&server)
        .await;
    let expected_url = format!("{}/files/slide.png", server.uri());
    Mock::given(method("POST"))
        .and(path("/integrations/gpt-vision/"))
        .and(body_partial_json(json!({
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": IMAGE_ANALYSIS_PROMPT },
                    { "type": "image_url", "image_url": { "url": expected_url } },
                ],
            }],
        })))
        .respond_with(completion("mild atypia, no invasion"))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = session_against(&server);
    session.upload_image(png_input()).await;

    assert_eq!(session.last_error, None);
    assert_eq!(session.images, vec![expected_url]);
    assert_eq!(session.messages.len(), 2);
    assert_eq!(session.messages[0].sender, Sender::User);
    assert_eq!(session.messages[0].text, "I've uploaded a new image for analysis");
    assert_eq!(session.messages[1].sender, Sender::Assistant);
    assert_eq!(session.messages[1].text, "mild atypia, no invasion");
}

#[tokio::test]
async fn data_upload_uses_the_gene_expression_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "url": "/files/expr.csv" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/integrations/gpt-vision/"))
        .and(body_partial_json(json!({
            "messages": [{
                "role": "user",
                "content": [{ "type": "text", "text": DATA_ANALYSIS_PROMPT }],
            }],
        })))
        .respond_with(completion("expression clusters detected"))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = session_against(&server);
    session
        .upload_data(UploadInput::File {
            filename: "expr.csv".to_string(),
            bytes: b"gene,value\n".to_vec(),
        })
        .await;

    assert_eq!(session.last_error, None);
    assert_eq!(session.data_files, vec![format!("{}/files/expr.csv", server.uri())]);
    assert_eq!(session.messages[0].text, "I've uploaded gene expression data for analysis");
    assert_eq!(session.messages[1].text, "expression clusters detected");
}

#[tokio::test]
async fn upload_failure_is_recorded_and_skips_analysis() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(413).set_body_string("too big"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/integrations/gpt-vision/"))
        .respond_with(completion("should never run"))
        .expect(0)
        .mount(&server)
        .await;

    let mut session = session_against(&server);
    session.upload_image(png_input()).await;

    assert_eq!(
        session.last_error.as_deref(),
        Some("Upload failed: File too large.")
    );
    assert!(session.images.is_empty());
    assert!(session.messages.is_empty());
}

#[tokio::test]
async fn analysis_failure_after_image_upload_sets_a_friendly_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "url": "/files/slide.png" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/integrations/gpt-vision/"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let mut session = session_against(&server);
    session.upload_image(png_input()).await;

    assert_eq!(session.last_error.as_deref(), Some("Failed to analyze image"));
    // The URL is kept even though analysis failed.
    assert_eq!(session.images.len(), 1);
    assert!(session.messages.is_empty());
}

#[tokio::test]
async fn chat_message_attaches_the_latest_image() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "url": "/files/slide.png" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/integrations/gpt-vision/"))
        .respond_with(completion("first answer"))
        .mount(&server)
        .await;

    let mut session = session_against(&server);
    session.upload_image(png_input()).await;

    // Re-mount so we can assert the chat turn carries the uploaded URL.
    server.reset().await;
    let expected_url = format!("{}/files/slide.png", server.uri());
    Mock::given(method("POST"))
        .and(path("/integrations/gpt-vision/"))
        .and(body_partial_json(json!({
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": "any mitotic figures?" },
                    { "type": "image_url", "image_url": { "url": expected_url } },
                ],
            }],
        })))
        .respond_with(completion("a few, in the upper field"))
        .expect(1)
        .mount(&server)
        .await;

    session.send_message("any mitotic figures?").await;

    let last = session.messages.last().unwrap();
    assert_eq!(last.sender, Sender::Assistant);
    assert_eq!(last.text, "a few, in the upper field");
}

#[tokio::test]
async fn chat_failure_degrades_to_the_fallback_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/integrations/gpt-vision/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let mut session = session_against(&server);
    session.send_message("what does this mean?").await;

    assert_eq!(session.messages.len(), 2);
    assert_eq!(session.messages[0].sender, Sender::User);
    assert_eq!(session.messages[0].text, "what does this mean?");
    assert_eq!(session.messages[1].sender, Sender::Assistant);
    assert_eq!(
        session.messages[1].text,
        "Sorry, I couldn't analyze that aspect of the data."
    );
}

#[tokio::test]
async fn search_sends_the_query_and_discards_the_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/integrations/chat-gpt/"))
        .and(body_partial_json(json!({
            "messages": [
                { "role": "system" },
                { "role": "user", "content": "Find relevant cancer research models for: lung adenocarcinoma" },
            ],
        })))
        .respond_with(completion("model suggestions nobody reads"))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_against(&server);
    session.search("lung adenocarcinoma").await;

    // Transcript and error slot are untouched by a search.
    assert!(session.messages.is_empty());
    assert_eq!(session.last_error, None);
}

#[test_log::test(tokio::test)]
async fn search_failure_is_swallowed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/integrations/chat-gpt/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("no"))
        .mount(&server)
        .await;

    let session = session_against(&server);
    // Must not panic or record anything.
    session.search("anything").await;
    assert_eq!(session.last_error, None);
}
