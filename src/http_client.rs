use reqwest::{Client, header};
use anyhow::Result;
use std::time::Duration;

/// Creates the HTTP client used to talk to the hosted document store
pub fn create_http_client(user_agent: &str, timeout: Duration) -> Result<Client> {
    let mut headers = header::HeaderMap::new();

    headers.insert(
        header::ACCEPT,
        header::HeaderValue::from_static("application/json")
    );
    headers.insert(
        header::CONNECTION,
        header::HeaderValue::from_static("keep-alive")
    );

    let client = Client::builder()
        .user_agent(user_agent)
        .default_headers(headers)
        .timeout(timeout)
        .build()?;

    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_http_client_succeeds() {
        let result = create_http_client("listing-view/0.1 (test)", Duration::from_secs(5));

        assert!(result.is_ok(), "Client creation should succeed");
    }

    #[tokio::test]
    async fn test_http_client_timeout_works() {
        let client = create_http_client("listing-view/0.1 (test)", Duration::from_secs(1))
            .expect("Failed to create HTTP client");

        // Accepts the connection but never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let silent = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(socket);
        });

        let result = client.get(format!("http://{}", addr)).send().await;

        let err = result.expect_err("Request to a silent server should time out");
        assert!(err.is_timeout(), "Expected a timeout, got {}", err);
        silent.abort();
    }
}
