use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::time::Duration;

use log::{debug, error};

use crate::texture::{ImageSource, SamplerSettings, Texture, TextureError, TextureSlot};

#[derive(Debug, Clone)]
pub struct TextureRequest {
    pub slot: TextureSlot,
    pub generation: u64,
    pub name: String,
    pub source: ImageSource,
    pub settings: SamplerSettings,
}

#[derive(Debug)]
pub struct LoadedTexture {
    pub slot: TextureSlot,
    pub generation: u64,
    pub result: Result<Texture, TextureError>,
}

// Decodes textures on worker threads; results are collected on the owner's thread.
pub struct TextureLoader {
    sender: Sender<LoadedTexture>,
    receiver: Receiver<LoadedTexture>,
    pending: usize,
}

impl TextureLoader {
    pub fn new() -> Self {
        let (sender, receiver) = channel();
        Self {
            sender,
            receiver,
            pending: 0,
        }
    }

    pub fn request(&mut self, request: TextureRequest) {
        debug!(
            "Loading {} texture from {} (generation {})",
            request.slot,
            request.source.describe(),
            request.generation
        );

        let sender = self.sender.clone();
        self.pending += 1;

        std::thread::spawn(move || {
            let result = Texture::load(request.name, &request.source, request.settings);
            // The receiver only goes away with the loader; nobody is left to tell.
            let _ = sender.send(LoadedTexture {
                slot: request.slot,
                generation: request.generation,
                result,
            });
        });
    }

    /// Loads that have finished since the last poll. Never blocks.
    pub fn poll(&mut self) -> Vec<LoadedTexture> {
        let mut finished = Vec::new();

        loop {
            match self.receiver.try_recv() {
                Ok(loaded) => {
                    self.pending -= 1;
                    if let Err(err) = &loaded.result {
                        error!("Failed to load {} texture: {}", loaded.slot, err);
                    }
                    finished.push(loaded);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }

        finished
    }

    /// Blocks for at most `timeout` waiting for the next load to finish.
    pub fn wait(&mut self, timeout: Duration) -> Option<LoadedTexture> {
        let loaded = self.receiver.recv_timeout(timeout).ok()?;
        self.pending -= 1;
        if let Err(err) = &loaded.result {
            error!("Failed to load {} texture: {}", loaded.slot, err);
        }
        Some(loaded)
    }

    pub fn pending(&self) -> usize {
        self.pending
    }
}

impl Default for TextureLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Path of a stock texture inside `texture_dir`, `None` for slots without one.
pub fn stock_texture_path(texture_dir: &Path, slot: TextureSlot) -> Option<PathBuf> {
    slot.file_name().map(|file_name| texture_dir.join(file_name))
}
