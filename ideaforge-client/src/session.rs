//! Session bootstrap

use crate::IdeaforgeClient;
use crate::error::Result;
use ideaforge_core::dto::session::SessionInit;

impl IdeaforgeClient {
    /// Initialise a session
    ///
    /// If the client already carries a session it is presented and reused
    /// when the server still knows it; otherwise a fresh one is issued.
    pub async fn init_session(&self) -> Result<SessionInit> {
        let mut request = self.client.post(self.url("/session/init"));
        if let Some(id) = self.session_id {
            request = request.header(crate::SESSION_HEADER, id.to_string());
        }

        let response = request.send().await?;
        self.handle_response(response).await
    }
}
