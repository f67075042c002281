use super::ProcessingContext;

/// Processes one category of inbound item.
///
/// Returning an error makes the dispatcher count a failure and ask the SMSC
/// to redeliver later.
pub trait Handler<T>: Send + Sync {
    fn process(&self, item: T, context: &ProcessingContext) -> Result<(), crate::Error>;
}

impl<T, F> Handler<T> for F
where
    F: Fn(T, &ProcessingContext) -> Result<(), crate::Error> + Send + Sync,
{
    fn process(&self, item: T, context: &ProcessingContext) -> Result<(), crate::Error> {
        self(item, context)
    }
}
