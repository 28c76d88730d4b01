// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use std::str::FromStr;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Expand a bare level (e.g. "debug") into a filter that keeps transport
/// crates quiet. Custom directive strings (with ',' or '=') pass through.
pub fn filter_spec_for(log_level: &str) -> String {
    let normalized = log_level.trim();
    if normalized.contains(',') || normalized.contains('=') {
        normalized.to_string()
    } else {
        format!(
            "{},h2=info,hyper=info,hyper_util=info,reqwest=info,rustls=info,alloy_transport_http=info,alloy_rpc_client=info",
            normalized
        )
    }
}

pub fn setup_logging(log_level: &str, json_format: bool) {
    let filter_spec = filter_spec_for(log_level);
    let filter = EnvFilter::from_str(&filter_spec).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::registry().with(filter);

    // try_init: a second call (tests, embedding) keeps the first subscriber.
    let installed = if json_format {
        let json_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(false);
        subscriber.with(json_layer).try_init().is_ok()
    } else {
        let fmt_layer = fmt::layer().with_target(true).compact();
        subscriber.with(fmt_layer).try_init().is_ok()
    };

    if installed {
        tracing::debug!(
            target: "config",
            filter = %filter_spec,
            format = if json_format { "json" } else { "compact" },
            "Logging initialized"
        );
    }
}
