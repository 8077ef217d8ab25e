//! The seam between the modes and the chat completions client.

use std::future::Future;

use croqli::api::RetryConfig;
use croqli::{ChatClient, ChatRequest};

/// Anything that can answer a chat request with text.
pub trait Completer {
    fn complete(&self, request: &ChatRequest) -> impl Future<Output = Result<String, String>>;
}

impl Completer for ChatClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String, String> {
        self.chat_with_retry(request, &RetryConfig::default())
            .await?
            .text()
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::*;

    /// Replies with canned responses in order and records every request.
    #[derive(Default)]
    pub struct ScriptedCompleter {
        replies: RefCell<VecDeque<Result<String, String>>>,
        pub requests: RefCell<Vec<ChatRequest>>,
    }

    impl ScriptedCompleter {
        pub fn new<I, T>(replies: I) -> Self
        where
            I: IntoIterator<Item = Result<T, String>>,
            T: Into<String>,
        {
            Self {
                replies: RefCell::new(replies.into_iter().map(|r| r.map(Into::into)).collect()),
                requests: RefCell::default(),
            }
        }
    }

    impl Completer for ScriptedCompleter {
        async fn complete(&self, request: &ChatRequest) -> Result<String, String> {
            self.requests.borrow_mut().push(request.clone());
            self.replies
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err("no scripted reply left".to_string()))
        }
    }
}
