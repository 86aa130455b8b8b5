use serde::Serialize;

use super::error::SerializationError;

/// Thin wrapper over serde_json used for every value the interceptor logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEncoder {
    pretty: bool,
}

impl JsonEncoder {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    pub fn encode<T>(&self, value: &T) -> Result<String, SerializationError>
    where
        T: Serialize + ?Sized,
    {
        let encoded = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(encoded)
    }
}

/// The ordered arguments of one handler invocation.
///
/// Implemented for tuples of `Serialize` values so each argument is encoded
/// on its own rather than as one aggregate.
pub trait InvocationArgs {
    fn encode_each(&self, encoder: &JsonEncoder) -> Vec<Result<String, SerializationError>>;
}

impl InvocationArgs for () {
    fn encode_each(&self, _encoder: &JsonEncoder) -> Vec<Result<String, SerializationError>> {
        Vec::new()
    }
}

macro_rules! impl_invocation_args {
    ($($name:ident),+) => {
        impl<$($name: Serialize),+> InvocationArgs for ($($name,)+) {
            #[allow(non_snake_case)]
            fn encode_each(&self, encoder: &JsonEncoder) -> Vec<Result<String, SerializationError>> {
                let ($($name,)+) = self;
                vec![$(encoder.encode($name)),+]
            }
        }
    };
}

impl_invocation_args!(A1);
impl_invocation_args!(A1, A2);
impl_invocation_args!(A1, A2, A3);
impl_invocation_args!(A1, A2, A3, A4);
impl_invocation_args!(A1, A2, A3, A4, A5);
impl_invocation_args!(A1, A2, A3, A4, A5, A6);
impl_invocation_args!(A1, A2, A3, A4, A5, A6, A7);
impl_invocation_args!(A1, A2, A3, A4, A5, A6, A7, A8);
