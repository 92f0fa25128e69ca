//! Background tasks owned by [`WsClient`](crate::WsClient).

pub(crate) mod read;
pub(crate) mod write;
