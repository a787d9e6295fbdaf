//! The RFC 959 Representation Type (`TYPE`) command

use crate::{
    auth::UserDetail,
    server::{
        controlchan::{
            error::ControlChanError,
            handler::{CommandContext, CommandHandler},
            Reply, ReplyCode,
        },
        session::TransferType,
    },
    storage::{Metadata, StorageBackend},
};
use async_trait::async_trait;

#[derive(Debug)]
pub struct Type {
    param: TransferType,
}

impl Type {
    pub fn new(param: TransferType) -> Self {
        Type { param }
    }
}

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Type
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let mut session = args.session.lock().await;
        session.transfer_type = self.param;
        let reply = match self.param {
            TransferType::Ascii => "Type set to A",
            TransferType::Image => "Type set to I",
        };
        Ok(Reply::new(ReplyCode::CommandOkay, reply))
    }
}
