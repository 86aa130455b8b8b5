//! Request/response logging for opted-in handlers.
//!
//! A handler opts in by running its body through [`AdminLogger::around`]
//! (explicit context) or [`AdminLogger::around_current`] (context bound by
//! [`crate::middleware::context`]), or by being wrapped once with
//! [`AdminLogger::wrap`]. Each invocation emits a request line, a request body
//! line with every argument encoded on its own, and, when the handler
//! succeeds, a response body line. The handler's arguments and outcome pass
//! through untouched.

use std::{future::Future, sync::Arc};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::warn;

use crate::{
    config::{AdminLogConfig, ArgumentErrorPolicy},
    metrics::ADMIN_LOG_METRICS,
};

pub mod context;
pub mod encoder;
pub mod error;
pub mod sink;

pub use context::{CallerAttributes, RequestAttributes, RequestContext, RequestId};
pub use encoder::{InvocationArgs, JsonEncoder};
pub use error::{AdminLogError, SerializationError};
pub use sink::{LogEntry, LogKind, LogLevel, LogSink, MemorySink, TracingSink};

#[derive(Clone)]
pub struct AdminLogger {
    settings: Arc<AdminLogConfig>,
    encoder: JsonEncoder,
    sink: Arc<dyn LogSink>,
}

impl AdminLogger {
    pub fn new(settings: AdminLogConfig, sink: Arc<dyn LogSink>) -> Self {
        Self {
            encoder: JsonEncoder::new(settings.pretty_json),
            settings: Arc::new(settings),
            sink,
        }
    }

    pub fn with_tracing(settings: AdminLogConfig) -> Self {
        Self::new(settings, Arc::new(TracingSink))
    }

    pub fn settings(&self) -> &AdminLogConfig {
        &self.settings
    }

    /// Logs one invocation of `proceed` made on behalf of `ctx`.
    ///
    /// The outer `Result` only carries interceptor failures; the inner one is
    /// exactly what `proceed` produced.
    pub async fn around<A, F, Fut, T, E>(
        &self,
        ctx: &RequestContext,
        args: A,
        proceed: F,
    ) -> Result<Result<T, E>, AdminLogError>
    where
        A: InvocationArgs,
        F: FnOnce(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        T: Serialize,
    {
        if !self.settings.enabled {
            return Ok(proceed(args).await);
        }

        ADMIN_LOG_METRICS.invocations_total.increment(1);
        self.log_request(ctx, &args)?;

        let outcome = proceed(args).await;

        if let Ok(value) = &outcome {
            self.log_response(ctx, value);
        }

        Ok(outcome)
    }

    /// Same as [`around`](Self::around) but reads the context bound to the
    /// current task. Fails with [`AdminLogError::MissingContext`] before
    /// anything runs when no context is bound.
    pub async fn around_current<A, F, Fut, T, E>(
        &self,
        args: A,
        proceed: F,
    ) -> Result<Result<T, E>, AdminLogError>
    where
        A: InvocationArgs,
        F: FnOnce(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        T: Serialize,
    {
        if !self.settings.enabled {
            return Ok(proceed(args).await);
        }

        let ctx = RequestContext::current().map_err(|e| {
            ADMIN_LOG_METRICS.missing_context_total.increment(1);
            warn!("Logged handler invoked outside a request scope");
            e
        })?;

        self.around(&ctx, args, proceed).await
    }

    /// Marks `handler` for logging.
    pub fn wrap<F>(&self, handler: F) -> Logged<F> {
        Logged {
            logger: self.clone(),
            handler,
        }
    }

    fn log_request<A>(&self, ctx: &RequestContext, args: &A) -> Result<(), AdminLogError>
    where
        A: InvocationArgs,
    {
        let caller = CallerAttributes::from_context(ctx);
        let unknown = self.settings.unknown_marker.as_str();

        let line = format!(
            "Request URL: {}, HTTP Method: {}, Client IP: {}, UserId: {}, Email: {}, UserRole: {}, Request Time: {}",
            ctx.url(),
            ctx.method(),
            ctx.client_addr()
                .map(|addr| addr.ip().to_string())
                .unwrap_or_else(|| unknown.to_string()),
            caller
                .user_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| unknown.to_string()),
            caller.email.as_deref().unwrap_or(unknown),
            caller.user_role.as_deref().unwrap_or(unknown),
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        );
        self.sink
            .emit(LogEntry::info(LogKind::Request, ctx.request_id(), line));

        let mut body = String::new();
        for (index, encoded) in args.encode_each(&self.encoder).into_iter().enumerate() {
            match encoded {
                Ok(json) => body.push_str(&json),
                Err(source) => {
                    ADMIN_LOG_METRICS
                        .argument_serialization_failures_total
                        .increment(1);

                    if self.settings.argument_errors == ArgumentErrorPolicy::Propagate {
                        return Err(AdminLogError::ArgumentSerialization { index, source });
                    }

                    self.sink.emit(LogEntry::error(
                        LogKind::SerializationFailure,
                        ctx.request_id(),
                        format!("Error converting argument {} to JSON: {}", index, source),
                    ));
                    body.push_str(&self.settings.argument_placeholder);
                }
            }
            body.push('\n');
        }
        self.sink
            .emit(LogEntry::info(LogKind::RequestBody, ctx.request_id(), body));

        Ok(())
    }

    fn log_response<T>(&self, ctx: &RequestContext, value: &T)
    where
        T: Serialize,
    {
        let text = match self.encoder.encode(value) {
            Ok(json) => json,
            Err(e) => {
                ADMIN_LOG_METRICS
                    .response_serialization_failures_total
                    .increment(1);
                self.sink.emit(LogEntry::error(
                    LogKind::SerializationFailure,
                    ctx.request_id(),
                    format!("Error converting response to JSON: {}", e),
                ));
                self.settings.response_placeholder.clone()
            }
        };

        self.sink
            .emit(LogEntry::info(LogKind::ResponseBody, ctx.request_id(), text));
    }
}

/// A handler that logs every call made through it.
#[derive(Clone)]
pub struct Logged<F> {
    logger: AdminLogger,
    handler: F,
}

impl<F> Logged<F> {
    pub async fn call<A, Fut, T, E>(
        &self,
        ctx: &RequestContext,
        args: A,
    ) -> Result<Result<T, E>, AdminLogError>
    where
        F: Fn(A) -> Fut,
        A: InvocationArgs,
        Fut: Future<Output = Result<T, E>>,
        T: Serialize,
    {
        self.logger.around(ctx, args, &self.handler).await
    }

    pub async fn call_current<A, Fut, T, E>(&self, args: A) -> Result<Result<T, E>, AdminLogError>
    where
        F: Fn(A) -> Fut,
        A: InvocationArgs,
        Fut: Future<Output = Result<T, E>>,
        T: Serialize,
    {
        self.logger.around_current(args, &self.handler).await
    }
}
