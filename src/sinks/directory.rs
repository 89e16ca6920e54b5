use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use log::debug;

use crate::record::GroupKey;
use crate::writer::{Inconsistency, Sink, SinkError, WriterState};

/// An artifact stored by a [`DirectorySink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredArtifact {
    /// Location under the sink root
    pub path: PathBuf,
    /// Membership the artifact was delivered under
    pub membership: GroupKey,
    /// Size in bytes at delivery time
    pub size: u64,
}

/// Stores artifacts under `<root>/<membership path>/`.
///
/// Ungrouped artifacts land directly in the root. Directory names come from
/// [`GroupKey::path_segments`], so distinct memberships never share a
/// directory. Each artifact is copied and synced before delivery is
/// confirmed.
#[derive(Debug)]
pub struct DirectorySink {
    root: PathBuf,
    delivered: Vec<DeliveredArtifact>,
}

impl DirectorySink {
    /// Create a sink rooted at `root`, creating the directory if needed
    pub fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            delivered: Vec::new(),
        })
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Artifacts stored so far, in delivery order
    pub fn delivered(&self) -> &[DeliveredArtifact] {
        &self.delivered
    }

    /// Directory for a membership
    pub fn directory_for(&self, membership: &GroupKey) -> PathBuf {
        let mut dir = self.root.clone();
        for segment in membership.path_segments() {
            dir.push(segment);
        }
        dir
    }
}

impl Sink for DirectorySink {
    fn deliver(&mut self, artifact: &Path, membership: &GroupKey) -> Result<(), SinkError> {
        let name = artifact.file_name().ok_or_else(|| {
            SinkError::Other(format!("Artifact has no file name: {}", artifact.display()))
        })?;
        let dir = self.directory_for(membership);
        fs::create_dir_all(&dir)?;

        let dest = dir.join(name);
        let size = fs::copy(artifact, &dest)?;
        File::open(&dest)?.sync_all()?;
        debug!(
            "Stored artifact for {} at {} ({} bytes)",
            membership,
            dest.display(),
            size
        );

        self.delivered.push(DeliveredArtifact {
            path: dest,
            membership: membership.clone(),
            size,
        });
        Ok(())
    }

    fn check_consistency(&self, state: &WriterState) -> Result<(), Inconsistency> {
        let stored = self.delivered.len() as u64;
        if stored != state.artifacts_delivered {
            return Err(Inconsistency::new(format!(
                "Sink stored {} artifacts but writer delivered {}",
                stored, state.artifacts_delivered
            )));
        }

        for artifact in &self.delivered {
            match fs::metadata(&artifact.path) {
                Ok(meta) if meta.len() == artifact.size => {}
                Ok(meta) => {
                    return Err(Inconsistency::new(format!(
                        "Artifact {} is {} bytes, expected {}",
                        artifact.path.display(),
                        meta.len(),
                        artifact.size
                    )));
                }
                Err(e) => {
                    return Err(Inconsistency::new(format!(
                        "Artifact {} is unreadable: {}",
                        artifact.path.display(),
                        e
                    )));
                }
            }
        }
        Ok(())
    }
}
