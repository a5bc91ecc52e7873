//! `ApiClient` 对真实 HTTP 响应的处理
//!
//! 每个测试启动一个只处理一次连接的本地服务器，返回预设响应并记录收到的请求

use consent_iq::{ApiClient, DocumentApi, DocumentFile, OperationError, UploadResult};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

async fn serve_once(status: u16, body: &str) -> (ApiClient, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let body = body.to_string();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        let reason = if status < 400 { "OK" } else { "Error" };
        let response = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            reason,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
        request
    });

    let client = ApiClient::with_base_url(&format!("http://{}", addr)).unwrap();
    (client, handle)
}

/// 读取完整请求（头部 + content-length 或 chunked 请求体）
async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let Some(head_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buf[..head_end]).to_ascii_lowercase();
        let body_len = buf.len() - head_end - 4;

        let content_length = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok());

        match content_length {
            Some(len) if body_len >= len => break,
            Some(_) => continue,
            None if head.contains("transfer-encoding: chunked") => {
                if buf.ends_with(b"0\r\n\r\n") {
                    break;
                }
            }
            None => break,
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn sample_file() -> DocumentFile {
    DocumentFile::new("contract.pdf", "application/pdf", b"%PDF-1.4 sample".to_vec())
}

#[tokio::test]
async fn test_upload_sends_multipart_and_decodes_text() {
    let (client, server) = serve_once(200, r#"{"extracted_text": "Sample contract text"}"#).await;

    let result = client.upload(&sample_file()).await;
    assert_eq!(
        result,
        Ok(UploadResult {
            extracted_text: "Sample contract text".to_string()
        })
    );

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /upload "));
    assert!(request.to_ascii_lowercase().contains("content-type: multipart/form-data"));
    assert!(request.contains(r#"name="file""#));
    assert!(request.contains(r#"filename="contract.pdf""#));
    assert!(request.contains("%PDF-1.4 sample"));
}

/// 500 且没有响应体：使用默认文案并带上状态码
#[tokio::test]
async fn test_error_without_body_uses_generic_message() {
    let (client, server) = serve_once(500, "").await;

    let err = client.upload(&sample_file()).await.unwrap_err();
    assert_eq!(err, OperationError::response(500, "An error occurred"));
    server.await.unwrap();
}

#[tokio::test]
async fn test_error_message_field_is_surfaced() {
    let (client, server) = serve_once(400, r#"{"message": "Unknown category"}"#).await;

    let err = client.analyze("Sample contract text", "Legal").await.unwrap_err();
    assert_eq!(err.message, "Unknown category");
    assert_eq!(err.status, Some(400));

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /analyze "));
    assert!(request.contains(r#""text":"Sample contract text""#));
    assert!(request.contains(r#""category":"Legal""#));
}

#[tokio::test]
async fn test_chat_sends_full_document_text() {
    let (client, server) = serve_once(200, r#"{"response": "You may cancel within 30 days."}"#).await;

    let reply = client
        .chat("Legal", "Can I cancel?", "Sample contract text")
        .await
        .unwrap();
    assert_eq!(reply.response, "You may cancel within 30 days.");

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /chat "));
    assert!(request.contains(r#""message":"Can I cancel?""#));
    assert!(request.contains(r#""document_text":"Sample contract text""#));
}

#[tokio::test]
async fn test_trust_and_balance_requests() {
    let (client, server) = serve_once(200, r#"{"score": 87, "verified": true, "organization": "Masumi Verified"}"#).await;
    let trust = client.check_trust_score("U2FtcGxl", "user-wallet-123").await.unwrap();
    assert_eq!(trust.score, 87.0);
    assert!(trust.verified);
    let request = server.await.unwrap();
    assert!(request.starts_with("POST /trust "));
    assert!(request.contains(r#""doc_hash":"U2FtcGxl""#));
    assert!(request.contains(r#""wallet":"user-wallet-123""#));

    let (client, server) = serve_once(200, r#"{"balance": 12.5, "access_granted": false}"#).await;
    let balance = client.check_token_balance("user-123").await.unwrap();
    assert_eq!(balance.balance, 12.5);
    assert!(!balance.access_granted);
    let request = server.await.unwrap();
    assert!(request.starts_with("POST /check-balance "));
    assert!(request.contains(r#""user_id":"user-123""#));
}

/// 结果页路径读取 `detail` 字段，并把分类作为表单字段上传
#[tokio::test]
async fn test_results_path_reads_detail_field() {
    let (client, server) = serve_once(422, r#"{"detail": "Unsupported file type"}"#).await;

    let err = client.upload_for_analysis(&sample_file(), "Legal").await.unwrap_err();
    assert_eq!(err, OperationError::response(422, "Unsupported file type"));

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /upload "));
    assert!(request.contains(r#"name="category""#));
    assert!(request.contains("Legal"));
}

#[tokio::test]
async fn test_results_path_fallback_message() {
    let (client, server) = serve_once(500, r#"{"message": "ignored here"}"#).await;

    let err = client.upload_for_analysis(&sample_file(), "Legal").await.unwrap_err();
    assert_eq!(err.message, "An error occurred while analyzing the document");
    assert_eq!(err.status, Some(500));
    server.await.unwrap();
}

#[tokio::test]
async fn test_undecodable_success_body_keeps_status() {
    let (client, server) = serve_once(200, "not json").await;

    let err = client.check_token_balance("user-123").await.unwrap_err();
    assert_eq!(err.status, Some(200));
    assert!(err.message.starts_with("Invalid response body"));
    server.await.unwrap();
}

/// 连接被拒绝：没有状态码
#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ApiClient::with_base_url(&format!("http://{}", addr)).unwrap();
    let err = client.check_token_balance("user-123").await.unwrap_err();
    assert!(err.is_transport());
    assert!(!err.message.is_empty());
}
