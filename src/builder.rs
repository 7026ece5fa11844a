use std::sync::Arc;
use crate::{
    error::{PlayerError, PlayerResult},
    node::UniversalNode,
    types::UserId,
};

pub struct NodeBuilder {
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) ssl: bool,
    pub(crate) pass: String,
    pub(crate) id: Option<UserId>,
    pub(crate) client_name: String,
}

impl Default for NodeBuilder {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 2333,
            ssl: false,
            pass: "youshallnotpass".to_string(),
            id: None,
            client_name: concat!("andeplay/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl NodeBuilder {
    pub fn set_host(&mut self, host: impl ToString) -> &mut Self {
        self.host = host.to_string();
        self
    }

    pub fn set_port(&mut self, port: u16) -> &mut Self {
        self.port = port;
        self
    }

    pub fn set_password(&mut self, password: impl ToString) -> &mut Self {
        self.pass = password.to_string();
        self
    }

    pub fn set_user_id(&mut self, id: impl Into<UserId>) -> &mut Self {
        self.id = Some(id.into());
        self
    }

    pub fn set_ssl(&mut self, ssl: bool) -> &mut Self {
        self.ssl = ssl;
        self
    }

    pub fn set_client_name(&mut self, name: impl ToString) -> &mut Self {
        self.client_name = name.to_string();
        self
    }

    pub(crate) fn rest_url(&self) -> String {
        if self.ssl { format!("https://{}:{}", self.host, self.port) } else { format!("http://{}:{}", self.host, self.port) }
    }

    pub(crate) fn socket_url(&self) -> String {
        if self.ssl { format!("wss://{}:{}/v3/websocket", self.host, self.port) } else { format!("ws://{}:{}/v3/websocket", self.host, self.port) }
    }

    pub(crate) fn build(self) -> PlayerResult<Arc<UniversalNode>> {
        let id = match self.id {
            Some(id) => id,
            None => return Err(PlayerError::InvalidArgument("the node needs the bot user id".to_string())),
        };

        Ok(UniversalNode::new(self, id)?)
    }
}
