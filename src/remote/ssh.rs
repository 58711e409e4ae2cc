//! SSH-backed remote command execution
//!
//! Runs individual commands on the NAS over an authenticated SSH
//! session. The session is established lazily on the first command so
//! that no-op coordinator passes (lock held, empty plot directory,
//! dry run) touch the network not at all.

use crate::config::RemoteConfig;
use crate::error::{PlotMoverError, Result};
use crate::remote::RemoteExecutor;
use ssh2::Session;
use std::cell::RefCell;
use std::io::Read;
use std::net::TcpStream;

/// Remote executor backed by an ssh2 session
pub struct SshExecutor {
    config: RemoteConfig,
    session: RefCell<Option<Session>>,
}

impl SshExecutor {
    /// Create an executor for the given NAS. No connection is made yet.
    pub fn new(config: RemoteConfig) -> Self {
        Self {
            config,
            session: RefCell::new(None),
        }
    }

    /// Connect and authenticate to the remote host
    fn connect(config: &RemoteConfig) -> Result<Session> {
        let addr = format!("{}:{}", config.host, config.port);
        let tcp = TcpStream::connect(&addr)
            .map_err(|e| PlotMoverError::connection(&config.host, e.to_string()))?;

        let mut session = Session::new()
            .map_err(|e| PlotMoverError::connection(&config.host, e.to_string()))?;
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|e| PlotMoverError::connection(&config.host, e.to_string()))?;

        Self::authenticate(&mut session, config)?;
        Ok(session)
    }

    /// Authenticate with the remote host: key file first, then agent
    fn authenticate(session: &mut Session, config: &RemoteConfig) -> Result<()> {
        if let Some(key_path) = &config.key_path {
            session
                .userauth_pubkey_file(&config.user, None, key_path, None)
                .map_err(|e| PlotMoverError::auth(&config.user, &config.host, e.to_string()))?;
        } else {
            let mut agent = session
                .agent()
                .map_err(|e| PlotMoverError::auth(&config.user, &config.host, e.to_string()))?;
            agent
                .connect()
                .map_err(|e| PlotMoverError::auth(&config.user, &config.host, e.to_string()))?;
            agent
                .list_identities()
                .map_err(|e| PlotMoverError::auth(&config.user, &config.host, e.to_string()))?;

            let identities: Vec<_> = agent.identities().unwrap_or_default();
            let mut authenticated = false;
            for identity in identities {
                if agent.userauth(&config.user, &identity).is_ok() {
                    authenticated = true;
                    break;
                }
            }

            if !authenticated {
                return Err(PlotMoverError::auth(
                    &config.user,
                    &config.host,
                    "No valid SSH key found in agent",
                ));
            }
        }

        if !session.authenticated() {
            return Err(PlotMoverError::auth(
                &config.user,
                &config.host,
                "Authentication failed",
            ));
        }

        Ok(())
    }
}

impl RemoteExecutor for SshExecutor {
    fn run(&self, command: &str) -> Result<String> {
        let mut guard = self.session.borrow_mut();
        if guard.is_none() {
            tracing::debug!("Opening SSH session to {}", self.config.host);
            *guard = Some(Self::connect(&self.config)?);
        }
        let session = guard.as_ref().unwrap();

        let mut channel = session
            .channel_session()
            .map_err(|e| PlotMoverError::remote(command, e.to_string()))?;
        channel
            .exec(command)
            .map_err(|e| PlotMoverError::remote(command, e.to_string()))?;

        let mut stdout = String::new();
        channel
            .read_to_string(&mut stdout)
            .map_err(|e| PlotMoverError::remote(command, e.to_string()))?;

        let mut stderr = String::new();
        channel
            .stderr()
            .read_to_string(&mut stderr)
            .map_err(|e| PlotMoverError::remote(command, e.to_string()))?;

        channel
            .wait_close()
            .map_err(|e| PlotMoverError::remote(command, e.to_string()))?;
        let status = channel
            .exit_status()
            .map_err(|e| PlotMoverError::remote(command, e.to_string()))?;

        if status != 0 {
            let output = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(PlotMoverError::remote(
                command,
                format!("exit status {status}: {output}"),
            ));
        }

        Ok(stdout)
    }
}
