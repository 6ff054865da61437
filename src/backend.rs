use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::api::executable::{Executable, Services};
use crate::api::{self, Request};
use crate::protocol;

/// Bind the backend listener and serve forever. Every accepted connection
/// gets its own task and carries exactly one request/response exchange. A
/// connection that fails in any way is logged and dropped without touching
/// the listener or its siblings.
pub async fn run(port: u16, services: Services) -> crate::Result<()> {
    let _ = tracing_subscriber::fmt()
        .try_init()
        .map_err(|e| debug!("Failed to initialize global tracing: {}", e));

    let listener = TcpListener::bind(("127.0.0.1", port)).await?;

    info!("backend listening on {}", listener.local_addr()?);

    loop {
        let (socket, client_address) = listener.accept().await?;
        let services = services.clone();
        debug!("accepted connection from {:?}", client_address);

        tokio::spawn(async move {
            if let Err(e) = handle_connection(socket, client_address, services).await {
                error!("connection failed: {e}");
            }
        });
    }
}

#[instrument(
    name = "connection",
    skip(stream, services),
    fields(connection_id, client_address)
)]
async fn handle_connection(
    stream: TcpStream,
    client_address: SocketAddr,
    services: Services,
) -> crate::Result<()> {
    tracing::Span::current()
        .record("connection_id", Uuid::new_v4().to_string())
        .record("client_address", client_address.to_string());

    protocol::serve(stream, |req| {
        let op = req.get_str(api::API).unwrap_or("<missing>");
        info!(%op, "dispatching request");

        let res = Request::from(&req).exec(&services)?;

        debug!(ret = res.get_str(api::RET).unwrap_or(""), "responding");
        Ok(res)
    })
    .await
}
