use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;

use crate::codec::{Error as CodecError, MessageCodec};
use crate::message::Message;

/// Send one framed request and wait for one framed response, like a very
/// small HTTP. The stream must carry a single logical exchange: callers must
/// not issue two concurrent requests over the same stream.
pub async fn request<S>(stream: S, req: Message) -> crate::Result<Message>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut framed = Framed::new(stream, MessageCodec);

    framed.send(req).await?;

    match framed.next().await {
        Some(res) => Ok(res?),
        None => Err(CodecError::IncompleteFrame.into()),
    }
}

/// The server half of [`request`]: receive one framed request, hand it to
/// `handler`, send the result back as one frame. The stream carries exactly
/// one exchange; the caller closes the connection afterwards.
///
/// A handler error aborts the exchange without a response; the peer sees
/// the connection close. Framing and decode errors never reach the handler.
pub async fn serve<S, H>(stream: S, handler: H) -> crate::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
    H: FnOnce(Message) -> crate::Result<Message>,
{
    let mut framed = Framed::new(stream, MessageCodec);

    let req = match framed.next().await {
        Some(req) => req?,
        None => return Err(CodecError::IncompleteFrame.into()),
    };

    let res = handler(req)?;
    framed.send(res).await?;

    Ok(())
}
