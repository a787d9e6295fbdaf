//! Black-box tests driving the server through a real FTP client.

use async_ftp::{types::FileType, FtpStream};
use ironftp::{options::ServerMode, Server, ServerBuilder};
use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};
use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU16, Ordering};

const USERNAME: &str = "test";
const PASSWORD: &str = "password";

static TESTPORT: AtomicU16 = AtomicU16::new(2121);

struct Harness {
    root: PathBuf,
    _tempdir: tempfile::TempDir,
    addr: String,
}

fn ensure_login_required<T: Debug>(r: async_ftp::types::Result<T>) {
    let err = r.unwrap_err().to_string();
    if !err.contains("530") {
        panic!("Could execute command without logging in!");
    }
}

async fn custom_server_harness<S>(s: S) -> Harness
where
    S: Fn(PathBuf) -> ServerBuilder<ironftp::storage::Filesystem, ironftp::auth::DefaultUser>,
{
    let port = TESTPORT.fetch_add(1, Ordering::Relaxed);
    let addr = format!("127.0.0.1:{}", port);
    let tempdir = tempfile::TempDir::new().unwrap();
    let root = tempdir.path().to_path_buf();

    let server = s(root.clone()).build().unwrap().listen(addr.clone());
    tokio::spawn(server);
    while FtpStream::connect(&addr).await.is_err() {
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    Harness { root, addr, _tempdir: tempdir }
}

#[fixture]
async fn harness() -> Harness {
    custom_server_harness(|root| Server::with_fs(root).credentials(USERNAME, PASSWORD)).await
}

async fn login(addr: &str) -> FtpStream {
    let mut ftp_stream = FtpStream::connect(addr).await.unwrap();
    ftp_stream.login(USERNAME, PASSWORD).await.unwrap();
    ftp_stream
}

#[rstest]
#[awt]
#[tokio::test]
async fn connect(#[future] harness: Harness) {
    FtpStream::connect(harness.addr).await.unwrap();
}

#[rstest]
#[awt]
#[tokio::test]
async fn login_with_configured_credentials(#[future] harness: Harness) {
    login(&harness.addr).await;
}

#[rstest]
#[awt]
#[tokio::test]
async fn login_with_wrong_password_fails(#[future] harness: Harness) {
    let mut ftp_stream = FtpStream::connect(harness.addr).await.unwrap();
    let err = ftp_stream.login(USERNAME, "not it").await.unwrap_err().to_string();
    assert!(err.contains("530"), "expected 530, got: {}", err);
}

#[rstest]
#[awt]
#[tokio::test]
async fn login_with_unknown_user_fails(#[future] harness: Harness) {
    let mut ftp_stream = FtpStream::connect(harness.addr).await.unwrap();
    let err = ftp_stream.login("mallory", PASSWORD).await.unwrap_err().to_string();
    assert!(err.contains("530"), "expected 530, got: {}", err);
}

#[rstest]
#[awt]
#[tokio::test]
async fn noop(#[future] harness: Harness) {
    let mut ftp_stream = FtpStream::connect(harness.addr).await.unwrap();
    ftp_stream.noop().await.unwrap();
}

#[rstest]
#[awt]
#[tokio::test]
async fn get(#[future] harness: Harness) {
    use std::io::Write;

    let mut filename = harness.root.clone();
    filename.push("bla.txt");
    let mut f = std::fs::File::create(filename.clone()).unwrap();

    let mut data = vec![0; 1024];
    getrandom::fill(&mut data).expect("Error generating random bytes");
    f.write_all(&data).unwrap();

    let mut ftp_stream = FtpStream::connect(harness.addr).await.unwrap();

    ensure_login_required(ftp_stream.simple_retr("bla.txt").await);

    ftp_stream.login(USERNAME, PASSWORD).await.unwrap();
    ftp_stream.transfer_type(FileType::Binary).await.unwrap();
    let remote_file = ftp_stream.simple_retr("bla.txt").await.unwrap();
    let remote_data = remote_file.into_inner();

    assert_eq!(remote_data, data);
}

#[rstest]
#[awt]
#[tokio::test]
async fn get_missing_file_fails(#[future] harness: Harness) {
    let mut ftp_stream = login(&harness.addr).await;
    let err = ftp_stream.simple_retr("doesnotexist.txt").await.unwrap_err().to_string();
    assert!(err.contains("550"), "expected 550, got: {}", err);
}

// Store a file, ask for its size, read it back byte-identical.
#[rstest]
#[awt]
#[tokio::test]
async fn put_size_get_roundtrip(#[future] harness: Harness) {
    use std::io::Cursor;

    let content = b"Hello, FTP!";

    let mut ftp_stream = FtpStream::connect(harness.addr).await.unwrap();
    let mut reader = Cursor::new(content);

    ensure_login_required(ftp_stream.put("test_file.txt", &mut reader).await);

    ftp_stream.login(USERNAME, PASSWORD).await.unwrap();
    ftp_stream.transfer_type(FileType::Binary).await.unwrap();
    ftp_stream.put("test_file.txt", &mut reader).await.unwrap();

    let size = ftp_stream.size("test_file.txt").await.unwrap();
    assert_eq!(size, Some(content.len()));

    let remote_data = ftp_stream.simple_retr("test_file.txt").await.unwrap().into_inner();
    assert_eq!(remote_data, content);

    assert_eq!(std::fs::read(harness.root.join("test_file.txt")).unwrap(), content);
}

#[tokio::test]
async fn put_in_read_only_mode_is_denied() {
    use std::io::Cursor;

    let h = custom_server_harness(|root| {
        Server::with_fs(root)
            .credentials(USERNAME, PASSWORD)
            .server_mode(ServerMode::ReadOnly)
    })
    .await;

    let mut ftp_stream = login(&h.addr).await;
    let err = ftp_stream.put("nope.txt", &mut Cursor::new(b"data")).await.unwrap_err().to_string();
    assert!(err.contains("550"), "expected 550, got: {}", err);
    assert!(!h.root.join("nope.txt").exists());

    // Reading still works in read-only mode.
    std::fs::write(h.root.join("yes.txt"), b"data").unwrap();
    ftp_stream.transfer_type(FileType::Binary).await.unwrap();
    let remote = ftp_stream.simple_retr("yes.txt").await.unwrap().into_inner();
    assert_eq!(remote, b"data");
}

mod list {
    use super::*;
    use pretty_assertions::assert_eq;

    #[rstest]
    #[awt]
    #[tokio::test]
    async fn root(#[future] harness: Harness) {
        let path = harness.root.join("test.txt");
        {
            let _f = std::fs::File::create(path);
        }

        let mut ftp_stream = FtpStream::connect(harness.addr).await.unwrap();

        ensure_login_required(ftp_stream.list(None).await);

        ftp_stream.login(USERNAME, PASSWORD).await.unwrap();
        let list = ftp_stream.list(None).await.unwrap();
        let mut found = false;
        for entry in list {
            if entry.contains("test.txt") {
                found = true;
                break;
            }
        }
        assert!(found);
    }

    /// The exact line format, because real clients parse it.
    #[rstest]
    #[awt]
    #[tokio::test]
    async fn file_line_format(#[future] harness: Harness) {
        std::fs::write(harness.root.join("test.txt"), b"0123456789").unwrap();

        let mut ftp_stream = login(&harness.addr).await;
        let list = ftp_stream.list(None).await.unwrap();
        assert_eq!(list.len(), 1);
        let re = regex::Regex::new(r"^-rw-r--r-- 1 ftp ftp 10 [A-Z][a-z]{2} \d{2} \d{2}:\d{2} test\.txt$").unwrap();
        assert!(re.is_match(&list[0]), "\"{}\" did not match the ls -l format", list[0]);
    }

    #[rstest]
    #[awt]
    #[tokio::test]
    async fn directory_line_format(#[future] harness: Harness) {
        std::fs::create_dir(harness.root.join("test_dir")).unwrap();

        let mut ftp_stream = login(&harness.addr).await;
        let list = ftp_stream.list(None).await.unwrap();
        assert_eq!(list.len(), 1);
        let re = regex::Regex::new(r"^drwxr-xr-x 1 ftp ftp 0 [A-Z][a-z]{2} \d{2} \d{2}:\d{2} test_dir$").unwrap();
        assert!(re.is_match(&list[0]), "\"{}\" did not match the ls -l format", list[0]);
    }

    #[rstest]
    #[awt]
    #[tokio::test]
    async fn subdir(#[future] harness: Harness) {
        let dir_in_root = tempfile::TempDir::new_in(&harness.root).unwrap();
        let path = dir_in_root.path().join("test.txt");
        {
            let _f = std::fs::File::create(path);
        }

        let mut ftp_stream = login(&harness.addr).await;
        let list = ftp_stream
            .list(dir_in_root.path().file_name().and_then(std::ffi::OsStr::to_str))
            .await
            .unwrap();
        assert!(list.iter().any(|entry| entry.contains("test.txt")));
    }

    #[rstest]
    #[awt]
    #[tokio::test]
    async fn missing_directory_fails(#[future] harness: Harness) {
        let mut ftp_stream = login(&harness.addr).await;
        let err = ftp_stream.list(Some("no_such_dir")).await.unwrap_err().to_string();
        assert!(err.contains("550"), "expected 550, got: {}", err);
    }
}

#[rstest]
#[awt]
#[tokio::test]
async fn nlst_gives_bare_names(#[future] harness: Harness) {
    let path = harness.root.join("test.txt");
    {
        let _f = std::fs::File::create(path);
    }

    let mut ftp_stream = FtpStream::connect(harness.addr).await.unwrap();

    ensure_login_required(ftp_stream.nlst(None).await);

    ftp_stream.login(USERNAME, PASSWORD).await.unwrap();
    let list = ftp_stream.nlst(None).await.unwrap();
    assert_eq!(list, vec!["test.txt"]);
}

#[rstest]
#[awt]
#[tokio::test]
async fn pwd(#[future] harness: Harness) {
    let mut ftp_stream = FtpStream::connect(harness.addr).await.unwrap();

    ensure_login_required(ftp_stream.pwd().await);

    ftp_stream.login(USERNAME, PASSWORD).await.unwrap();
    let pwd = ftp_stream.pwd().await.unwrap();
    assert_eq!(&pwd, "/");
}

#[rstest]
#[awt]
#[tokio::test]
async fn cwd_and_cdup(#[future] harness: Harness) {
    let mut ftp_stream = login(&harness.addr).await;

    // Walk down two levels and back up one.
    ftp_stream.mkdir("outer_dir").await.unwrap();
    ftp_stream.cwd("outer_dir").await.unwrap();
    ftp_stream.mkdir("inner_dir").await.unwrap();
    assert_eq!(ftp_stream.pwd().await.unwrap(), "/outer_dir");

    ftp_stream.cwd("inner_dir").await.unwrap();
    assert_eq!(ftp_stream.pwd().await.unwrap(), "/outer_dir/inner_dir");

    ftp_stream.cdup().await.unwrap();
    assert_eq!(ftp_stream.pwd().await.unwrap(), "/outer_dir");
}

#[rstest]
#[awt]
#[tokio::test]
async fn cwd_to_file_fails(#[future] harness: Harness) {
    std::fs::write(harness.root.join("plain.txt"), b"x").unwrap();
    let mut ftp_stream = login(&harness.addr).await;
    let err = ftp_stream.cwd("plain.txt").await.unwrap_err().to_string();
    assert!(err.contains("550"), "expected 550, got: {}", err);
    assert_eq!(ftp_stream.pwd().await.unwrap(), "/");
}

#[rstest]
#[awt]
#[tokio::test]
async fn cwd_cannot_escape_the_root(#[future] harness: Harness) {
    let mut ftp_stream = login(&harness.addr).await;
    // Climbing past the root clamps at the root.
    ftp_stream.cwd("../../..").await.unwrap();
    assert_eq!(ftp_stream.pwd().await.unwrap(), "/");
}

#[rstest]
#[awt]
#[tokio::test]
async fn mkdir_then_list_then_rmdir(#[future] harness: Harness) {
    let mut ftp_stream = FtpStream::connect(harness.addr).await.unwrap();

    ensure_login_required(ftp_stream.mkdir("test_dir").await);

    ftp_stream.login(USERNAME, PASSWORD).await.unwrap();
    ftp_stream.mkdir("test_dir").await.unwrap();
    assert!(std::fs::metadata(harness.root.join("test_dir")).unwrap().is_dir());
    let list = ftp_stream.list(None).await.unwrap();
    assert!(list.iter().any(|entry| entry.contains("test_dir")));

    ftp_stream.rmdir("test_dir").await.unwrap();
    assert!(!harness.root.join("test_dir").exists());
    let list = ftp_stream.list(None).await.unwrap();
    assert!(!list.iter().any(|entry| entry.contains("test_dir")));
}

#[rstest]
#[awt]
#[tokio::test]
async fn dele(#[future] harness: Harness) {
    let file_in_root = tempfile::NamedTempFile::new_in(&harness.root).unwrap();
    let file_name = file_in_root.path().file_name().unwrap().to_str().unwrap();

    let mut ftp_stream = FtpStream::connect(harness.addr.clone()).await.unwrap();

    ensure_login_required(ftp_stream.rm(file_name).await);

    ftp_stream.login(USERNAME, PASSWORD).await.unwrap();
    ftp_stream.rm(file_name).await.unwrap();
    assert_eq!(std::fs::metadata(file_in_root.path()).unwrap_err().kind(), std::io::ErrorKind::NotFound);
}

#[rstest]
#[awt]
#[tokio::test]
async fn rename(#[future] harness: Harness) {
    let full_from = harness.root.join("old name.txt");
    let _f = std::fs::File::create(&full_from);

    let full_to = harness.root.join("new name.txt");

    let mut ftp_stream = FtpStream::connect(harness.addr.clone()).await.unwrap();

    ensure_login_required(ftp_stream.rename("old name.txt", "new name.txt").await);

    ftp_stream.login(USERNAME, PASSWORD).await.unwrap();
    ftp_stream.rename("old name.txt", "new name.txt").await.unwrap();

    std::fs::metadata(full_from).expect_err("Renamed file still exists with old name");
    assert!(std::fs::metadata(full_to).expect("New filename not created").is_file());
}

#[rstest]
#[awt]
#[tokio::test]
async fn mdtm(#[future] harness: Harness) {
    let path = harness.root.join("test.txt");
    let f = std::fs::File::create(path).unwrap();
    let modified = f.metadata().unwrap().modified().unwrap();

    let mut ftp_stream = login(&harness.addr).await;
    let r = ftp_stream.mdtm("test.txt").await.unwrap().unwrap();
    assert_eq!(r.to_rfc2822(), chrono::DateTime::<chrono::Utc>::from(modified).to_rfc2822());
}

#[rstest]
#[awt]
#[tokio::test]
async fn size_of_directory_fails(#[future] harness: Harness) {
    std::fs::create_dir(harness.root.join("d")).unwrap();
    let mut ftp_stream = login(&harness.addr).await;
    let err = ftp_stream.size("d").await.unwrap_err().to_string();
    assert!(err.contains("550"), "expected 550, got: {}", err);
}

#[rstest]
#[awt]
#[tokio::test]
async fn quit(#[future] harness: Harness) {
    let mut ftp_stream = FtpStream::connect(harness.addr).await.unwrap();
    ftp_stream.quit().await.unwrap();
    // Make sure the connection is actually closed; this may take a
    // moment, so poll for a bit.
    let mut c = 0;
    while ftp_stream.noop().await.is_ok() {
        assert!(c < 100, "Timeout waiting for connection to close");
        c += 1;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn stop_closes_listener_and_sessions() {
    let port = TESTPORT.fetch_add(1, Ordering::Relaxed);
    let addr = format!("127.0.0.1:{}", port);
    let tempdir = tempfile::TempDir::new().unwrap();

    let server = Server::with_fs(tempdir.path().to_path_buf())
        .credentials(USERNAME, PASSWORD)
        .build()
        .unwrap();
    let stop = server.stop_handle();
    tokio::spawn(server.listen(addr.clone()));
    while FtpStream::connect(&addr).await.is_err() {
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    let mut ftp_stream = login(&addr).await;

    // Stopping twice must be harmless and block until shutdown is done.
    stop.stop().await;
    stop.stop().await;

    // The open session was told the service is going away.
    let mut c = 0;
    while ftp_stream.noop().await.is_ok() {
        assert!(c < 100, "Timeout waiting for session to close");
        c += 1;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    // And new clients cannot connect anymore.
    assert!(FtpStream::connect(&addr).await.is_err());
}
