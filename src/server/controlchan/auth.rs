use crate::{
    auth::UserDetail,
    server::{
        controlchan::{error::ControlChanError, middleware::ControlChanMiddleware, Command, Event, Reply, ReplyCode},
        session::SharedSession,
        SessionState,
    },
    storage::{Metadata, StorageBackend},
};

use async_trait::async_trait;

// AuthMiddleware ensures the user is authenticated before he can do much
// else.
pub struct AuthMiddleware<Storage, User, Next>
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
    Next: ControlChanMiddleware,
{
    pub session: SharedSession<Storage, User>,
    pub next: Next,
}

#[async_trait]
impl<Storage, User, Next> ControlChanMiddleware for AuthMiddleware<Storage, User, Next>
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
    Next: ControlChanMiddleware,
{
    async fn handle(&mut self, event: Event) -> Result<Reply, ControlChanError> {
        match event {
            // Internal messages and the commands below are exempt from
            // the auth check.
            Event::InternalMsg(_)
            | Event::Command(Command::User { .. })
            | Event::Command(Command::Pass { .. })
            | Event::Command(Command::Quit)
            | Event::Command(Command::Feat)
            | Event::Command(Command::Noop) => self.next.handle(event).await,
            _ => {
                let session_state = {
                    let session = self.session.lock().await;
                    session.state
                };
                if session_state != SessionState::WaitCmd {
                    Ok(Reply::new(ReplyCode::NotLoggedIn, "Not logged in"))
                } else {
                    self.next.handle(event).await
                }
            }
        }
    }
}
