// Explicit pre-send / post-receive hooks
//
// Interceptor-style side effects are modeled as plain functions composed by
// the engine itself, so retry and refresh logic stays independent of any
// transport library's hook API.

use reqwest::header::HeaderMap;

/// Mutable view of an outgoing request, handed to pre-send hooks before
/// each send (including resends, with the current attempt number).
pub struct RequestContext {
    pub path: String,
    pub attempt: u32,
    pub headers: HeaderMap,
}

/// Read-only view of a received response, handed to post-receive hooks
/// before failure classification runs.
pub struct ResponseContext {
    pub path: String,
    pub status: u16,
}

pub type PreSendHook = Box<dyn Fn(&mut RequestContext) + Send + Sync>;
pub type PostReceiveHook = Box<dyn Fn(&ResponseContext) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_pre_send_hook_can_inject_headers() {
        let hook: PreSendHook = Box::new(|ctx| {
            ctx.headers.insert("X-Trace-Id", HeaderValue::from_static("abc"));
        });
        let mut ctx =
            RequestContext { path: "get_products/".to_string(), attempt: 0, headers: HeaderMap::new() };
        hook(&mut ctx);
        assert_eq!(ctx.headers.get("X-Trace-Id").unwrap(), "abc");
    }
}
