//! ---
//! rack_section: "03-logging"
//! rack_subsection: "module"
//! rack_type: "source"
//! rack_scope: "code"
//! rack_description: "Structured rack event helpers."
//! rack_version: "v0.0.0-prealpha"
//! rack_owner: "tbd"
//! ---
/// Emit an informational log enriched with rack context.
#[macro_export]
macro_rules! rack_info {
    (context = $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        tracing::event!(
            tracing::Level::INFO,
            rack = ctx.rack.unwrap_or(""),
            version = ctx.version.unwrap_or(""),
            operation = ctx.operation.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
    ($($arg:tt)+) => {{
        $crate::rack_info!(context = $crate::LogContext::default(), $($arg)+)
    }};
}

/// Emit a warning enriched with rack context.
#[macro_export]
macro_rules! rack_warn {
    (context = $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        tracing::event!(
            tracing::Level::WARN,
            rack = ctx.rack.unwrap_or(""),
            version = ctx.version.unwrap_or(""),
            operation = ctx.operation.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
    ($($arg:tt)+) => {{
        $crate::rack_warn!(context = $crate::LogContext::default(), $($arg)+)
    }};
}

/// Emit an error log enriched with rack context.
#[macro_export]
macro_rules! rack_error {
    (context = $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        tracing::event!(
            tracing::Level::ERROR,
            rack = ctx.rack.unwrap_or(""),
            version = ctx.version.unwrap_or(""),
            operation = ctx.operation.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
    ($($arg:tt)+) => {{
        $crate::rack_error!(context = $crate::LogContext::default(), $($arg)+)
    }};
}
