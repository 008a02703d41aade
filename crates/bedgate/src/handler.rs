//! Per-connection handler: read frames, decode, drive the login.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! Packets for one connection are handled strictly one after another; the
//! only thing tasks share is the read-only [`ServerState`].

use std::sync::Arc;

use bedgate_session::HandshakePhase;
use bedgate_transport::Connection;
use tokio::time::Instant;

use crate::login::{CloseReason, Flow, LoginHandler};
use crate::server::ServerState;
use crate::{GatewayError, ServerDirectory, SessionRouter};

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C, R, D>(
    conn: C,
    state: Arc<ServerState<R, D>>,
) -> Result<(), GatewayError>
where
    C: Connection,
    R: SessionRouter,
    D: ServerDirectory,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let mut login = LoginHandler::new(&conn, &state);
    let result = read_loop(&conn, &state, &mut login).await;
    let reason = match &result {
        Ok(reason) => reason.to_string(),
        Err(e) => e.to_string(),
    };

    let session = login.session();
    match session.player() {
        Some(player) => tracing::info!(
            %conn_id,
            player = %player.auth.display_name,
            phase = %session.phase(),
            %reason,
            "player disconnected"
        ),
        None => tracing::debug!(
            %conn_id,
            phase = %session.phase(),
            %reason,
            "connection ended"
        ),
    }
    if let Err(e) = conn.close().await {
        tracing::debug!(%conn_id, error = %e, "close failed");
    }
    result.map(|_| ())
}

/// Reads until the connection should close and says why.
///
/// Until login completes every packet counts against one deadline set
/// when the connection opened; afterwards each packet gets the idle
/// timeout.
async fn read_loop<C, R, D>(
    conn: &C,
    state: &ServerState<R, D>,
    login: &mut LoginHandler<'_, C, R, D>,
) -> Result<CloseReason, GatewayError>
where
    C: Connection,
    R: SessionRouter,
    D: ServerDirectory,
{
    let conn_id = conn.id();
    let login_deadline = Instant::now() + state.login_timeout;

    loop {
        let received = if login.session().phase() == HandshakePhase::AwaitingLogin {
            tokio::time::timeout_at(login_deadline, conn.recv()).await
        } else {
            tokio::time::timeout(state.idle_timeout, conn.recv()).await
        };

        let data = match received {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => return Ok(CloseReason::ClientClosed),
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                tracing::info!(
                    %conn_id,
                    phase = %login.session().phase(),
                    "connection timed out"
                );
                return Ok(CloseReason::TimedOut);
            }
        };

        let packet = match login.codec().decode(&data) {
            Ok(packet) => packet,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode packet");
                continue;
            }
        };

        if let Flow::Close(reason) = login.handle(packet).await? {
            return Ok(reason);
        }
    }
}
