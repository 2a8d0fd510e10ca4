use axum::{extract::Request, extract::State, middleware::Next, response::Response};

use viewmeter_core::usage::UsageMeter;

/// Measure process CPU and memory around the inner stack.
///
/// The response passes through untouched. Gauges are keyed by the view bound
/// in the request context when teardown runs.
pub async fn measure(State(meter): State<UsageMeter>, req: Request, next: Next) -> Response {
    meter.measure_async(next.run(req)).await
}
