//! Message trait for command data.

/// A marker trait for the data carried through a dispatch.
///
/// Command targets, payloads and handler return values must be
/// `Send + Sync + 'static` so that the same dispatch contract can run on
/// the blocking and the async dispatcher alike.
///
/// Every type meeting those bounds is a `Message`; there is nothing to
/// implement by hand.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a valid Message",
    label = "must be `Send + Sync + 'static`",
    note = "Command targets, payloads and handler values must be thread-safe and static."
)]
pub trait Message: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Message for T {}
