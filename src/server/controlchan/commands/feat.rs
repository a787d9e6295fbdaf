//! The RFC 2389 Feature (`FEAT`) command

use crate::{
    auth::UserDetail,
    server::controlchan::{
        error::ControlChanError,
        handler::{CommandContext, CommandHandler},
        Reply, ReplyCode,
    },
    storage::{Metadata, StorageBackend},
};
use async_trait::async_trait;

#[derive(Debug)]
pub struct Feat;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Feat
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, _args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        // Each feature line must be indented by a space.
        let mut feat_text = vec![" EPRT", " EPSV", " MDTM", " REST STREAM", " SIZE", " UTF8"];

        feat_text.sort_unstable();
        feat_text.insert(0, "Extensions supported:");
        feat_text.push("End");

        Ok(Reply::new_multiline(ReplyCode::SystemStatus, feat_text))
    }
}
