use crate::error::{Result, SitePublishError};
use crate::remote::{RemoteOutput, RemoteSession};
use ssh2::{CheckResult, ExtendedData, KnownHostFileKind, KnownHosts, Session, Sftp};
use std::fs::File;
use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::path::{Path, PathBuf};

/// Private keys tried, in order, when the agent cannot authenticate
const DEFAULT_KEYS: [&str; 3] = ["id_ed25519", "id_ecdsa", "id_rsa"];

/// `[user@]host[:port]` as given on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTarget {
    pub user: String,
    pub host: String,
    pub port: u16,
}

impl SshTarget {
    /// Parse a target, falling back to `default_port` and the local user name.
    pub fn parse(input: &str, default_port: u16) -> Result<Self> {
        let (user, rest) = match input.split_once('@') {
            Some((user, rest)) => (Some(user.to_string()), rest),
            None => (None, input),
        };

        let (host, port) = match rest.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|_| {
                    SitePublishError::config(format!("Invalid port in deploy host '{}'", input))
                })?;
                (host, port)
            }
            None => (rest, default_port),
        };

        if host.is_empty() {
            return Err(SitePublishError::config(format!(
                "Missing host name in '{}'",
                input
            )));
        }

        let user = match user {
            Some(user) if !user.is_empty() => user,
            _ => std::env::var("USER")
                .or_else(|_| std::env::var("USERNAME"))
                .map_err(|_| {
                    SitePublishError::config(format!(
                        "No user in deploy host '{}' and no local user name set",
                        input
                    ))
                })?,
        };

        Ok(SshTarget {
            user,
            host: host.to_string(),
            port,
        })
    }
}

/// Live SSH connection with a lazily opened SFTP channel.
///
/// The connection is closed on drop if [RemoteSession::close] was never
/// called, so every exit path releases it.
pub struct SshSession {
    session: Session,
    sftp: Option<Sftp>,
    open: bool,
}

impl SshSession {
    /// Connect, verify the host key against `known_hosts`, authenticate.
    ///
    /// A host that is not listed, or listed with another key, is rejected
    /// before any credential is sent.
    pub fn connect(target: &SshTarget, known_hosts: &Path) -> Result<Self> {
        let tcp = TcpStream::connect((target.host.as_str(), target.port)).map_err(|e| {
            SitePublishError::connection(format!("{}:{}: {}", target.host, target.port, e))
        })?;

        let mut session = Session::new()?;
        session.set_tcp_stream(tcp);
        session.handshake()?;

        // Owned from here on: dropping `this` on an error below disconnects.
        let this = SshSession {
            session,
            sftp: None,
            open: true,
        };

        this.verify_host(target, known_hosts)?;
        this.authenticate(&target.user)?;
        Ok(this)
    }

    fn verify_host(&self, target: &SshTarget, known_hosts: &Path) -> Result<()> {
        let mut hosts = self.session.known_hosts()?;
        hosts.read_file(known_hosts, KnownHostFileKind::OpenSSH)?;

        let (key, _) = self
            .session
            .host_key()
            .ok_or_else(|| SitePublishError::connection("server sent no host key"))?;

        check_host_key(&hosts, known_hosts, &target.host, target.port, key)
    }

    fn authenticate(&self, user: &str) -> Result<()> {
        if self.session.userauth_agent(user).is_ok() && self.session.authenticated() {
            return Ok(());
        }

        for key in default_key_files() {
            if self
                .session
                .userauth_pubkey_file(user, None, &key, None)
                .is_ok()
                && self.session.authenticated()
            {
                return Ok(());
            }
        }

        Err(SitePublishError::connection(format!(
            "authentication failed for user '{}'",
            user
        )))
    }

    fn sftp(&mut self) -> Result<&Sftp> {
        if self.sftp.is_none() {
            self.sftp = Some(self.session.sftp()?);
        }
        self.sftp
            .as_ref()
            .ok_or_else(|| SitePublishError::connection("SFTP subsystem unavailable"))
    }
}

/// Match a server key against loaded known hosts. Anything but an exact
/// match is a [SitePublishError::Connection].
pub fn check_host_key(
    hosts: &KnownHosts,
    source: &Path,
    host: &str,
    port: u16,
    key: &[u8],
) -> Result<()> {
    match hosts.check_port(host, port, key) {
        CheckResult::Match => Ok(()),
        CheckResult::NotFound => Err(SitePublishError::connection(format!(
            "host '{}' is not listed in {}",
            host,
            source.display()
        ))),
        CheckResult::Mismatch => Err(SitePublishError::connection(format!(
            "host key for '{}' does not match {}",
            host,
            source.display()
        ))),
        CheckResult::Failure => Err(SitePublishError::connection(format!(
            "could not check host key for '{}'",
            host
        ))),
    }
}

/// `~/.ssh/known_hosts`, used when the project carries no known-hosts file
pub fn user_known_hosts() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".ssh").join("known_hosts"))
}

fn default_key_files() -> Vec<PathBuf> {
    let Some(home) = dirs::home_dir() else {
        return Vec::new();
    };
    DEFAULT_KEYS
        .iter()
        .map(|name| home.join(".ssh").join(name))
        .filter(|path| path.is_file())
        .collect()
}

impl RemoteSession for SshSession {
    fn exec(&mut self, command: &str, stdin: Option<&str>) -> Result<RemoteOutput> {
        let mut channel = self.session.channel_session()?;
        // stderr is folded into stdout so a chatty command cannot stall on
        // an undrained stream
        channel.handle_extended_data(ExtendedData::Merge)?;
        channel.exec(command)?;

        if let Some(input) = stdin {
            channel.write_all(input.as_bytes())?;
        }
        channel.send_eof()?;

        let mut stdout = String::new();
        channel.read_to_string(&mut stdout)?;

        channel.wait_close()?;
        Ok(RemoteOutput {
            code: channel.exit_status()?,
            stdout,
            stderr: String::new(),
        })
    }

    fn mkdir(&mut self, path: &str) -> Result<()> {
        let sftp = self.sftp()?;
        let remote = Path::new(path);
        if let Err(e) = sftp.mkdir(remote, 0o755) {
            match sftp.stat(remote) {
                Ok(stat) if stat.is_dir() => {}
                _ => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn upload_file(&mut self, local: &Path, remote: &str) -> Result<()> {
        let mut source = File::open(local)?;
        let sftp = self.sftp()?;
        let mut target = sftp.create(Path::new(remote))?;
        io::copy(&mut source, &mut target)?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        self.sftp = None;
        self.session.disconnect(None, "deploy finished", None)?;
        Ok(())
    }
}

impl Drop for SshSession {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_target() {
        let target = SshTarget::parse("deploy@example.com:2222", 22).unwrap();
        assert_eq!(
            target,
            SshTarget {
                user: "deploy".to_string(),
                host: "example.com".to_string(),
                port: 2222,
            }
        );
    }

    #[test]
    fn test_parse_default_port() {
        let target = SshTarget::parse("deploy@example.com", 22).unwrap();
        assert_eq!(target.port, 22);
        assert_eq!(target.host, "example.com");
    }

    #[test]
    fn test_parse_invalid_port() {
        assert!(SshTarget::parse("deploy@example.com:ssh", 22).is_err());
    }

    #[test]
    fn test_parse_missing_host() {
        assert!(SshTarget::parse("deploy@", 22).is_err());
    }

    // A made-up ed25519 public key blob: type string then 32 key bytes
    fn host_key_blob(fill: u8) -> Vec<u8> {
        let mut blob = Vec::new();
        blob.extend_from_slice(&11u32.to_be_bytes());
        blob.extend_from_slice(b"ssh-ed25519");
        blob.extend_from_slice(&32u32.to_be_bytes());
        blob.extend_from_slice(&[fill; 32]);
        blob
    }

    fn known_hosts_file(dir: &Path) -> (Session, PathBuf) {
        let session = Session::new().unwrap();
        let path = dir.join("known_hosts");
        let mut hosts = session.known_hosts().unwrap();
        hosts
            .add("deploy.example.com", &host_key_blob(7), "", ssh2::KnownHostKeyFormat::Ed25519)
            .unwrap();
        hosts.write_file(&path, KnownHostFileKind::OpenSSH).unwrap();
        (session, path)
    }

    #[test]
    fn test_check_host_key_against_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let (session, path) = known_hosts_file(dir.path());
        let mut hosts = session.known_hosts().unwrap();
        hosts.read_file(&path, KnownHostFileKind::OpenSSH).unwrap();

        assert!(check_host_key(&hosts, &path, "deploy.example.com", 22, &host_key_blob(7)).is_ok());

        let unknown = check_host_key(&hosts, &path, "evil.example.com", 22, &host_key_blob(7));
        assert!(matches!(unknown, Err(SitePublishError::Connection(ref m)) if m.contains("not listed")));

        let changed = check_host_key(&hosts, &path, "deploy.example.com", 22, &host_key_blob(9));
        assert!(matches!(changed, Err(SitePublishError::Connection(ref m)) if m.contains("does not match")));
    }
}
