use axum::Router;

/// Serve `app` on an ephemeral local port and return its base URL.
pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });
    format!("http://{addr}")
}

/// The reference payload: five levels, padding, two ids.
#[allow(dead_code)]
pub const REFERENCE_PAYLOAD: [u8; 20] = [
    0x05, 0x00, 0x00, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x00, 0x00, 0x00, 0x0A, 0x00, 0x00,
    0x00, 0x0B, 0x00, 0x00, 0x00,
];
