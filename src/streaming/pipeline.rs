//! Ordered composition of transform stages.
//!
//! The write side runs `checksum → compress → encrypt → mirror → count`:
//! the CRC covers the uncompressed plaintext, the count is the compressed
//! size to record. The read side runs `decrypt → decompress → checksum`,
//! optionally mirroring plaintext into a destination.
//!
//! Input is consumed in chunks of the configured buffer size, and the
//! output of the last stage is discarded, so memory stays bounded no matter
//! how large the payload is. Any stage error aborts the run.

use std::io::Write;

use log::trace;

use crate::Result;
use crate::crypto::EncryptionMethod;

use super::source::{Source, read_chunk};
use super::transform::{
    ChecksumStage, Compressor, CountStage, Decompressor, Decryptor, Encryptor, MirrorStage,
    Transform,
};

/// A pipeline stage.
#[derive(Debug)]
pub enum Stage<'a> {
    /// CRC-32 accumulator.
    Checksum(ChecksumStage),
    /// DEFLATE compression.
    Compress(Compressor),
    /// DEFLATE decompression.
    Decompress(Decompressor),
    /// Encryption.
    Encrypt(Encryptor),
    /// Decryption.
    Decrypt(Decryptor),
    /// Copy to a destination.
    Mirror(MirrorStage<'a>),
    /// Byte counter.
    Count(CountStage),
}

impl Stage<'_> {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Checksum(_) => "checksum",
            Self::Compress(_) => "compress",
            Self::Decompress(_) => "decompress",
            Self::Encrypt(_) => "encrypt",
            Self::Decrypt(_) => "decrypt",
            Self::Mirror(_) => "mirror",
            Self::Count(_) => "count",
        }
    }
}

impl Transform for Stage<'_> {
    fn update(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<()> {
        match self {
            Self::Checksum(s) => s.update(input, out),
            Self::Compress(s) => s.update(input, out),
            Self::Decompress(s) => s.update(input, out),
            Self::Encrypt(s) => s.update(input, out),
            Self::Decrypt(s) => s.update(input, out),
            Self::Mirror(s) => s.update(input, out),
            Self::Count(s) => s.update(input, out),
        }
    }

    fn finish(&mut self, out: &mut Vec<u8>) -> Result<()> {
        match self {
            Self::Checksum(s) => s.finish(out),
            Self::Compress(s) => s.finish(out),
            Self::Decompress(s) => s.finish(out),
            Self::Encrypt(s) => s.finish(out),
            Self::Decrypt(s) => s.finish(out),
            Self::Mirror(s) => s.finish(out),
            Self::Count(s) => s.finish(out),
        }
    }
}

/// What the write-side pipeline should do besides counting.
#[derive(Debug, Clone, Copy, Default)]
pub struct WritePlan<'m> {
    /// Compute the CRC-32 of the plaintext.
    pub checksum: bool,
    /// DEFLATE level, or `None` to store.
    pub compression_level: Option<u32>,
    /// Encryption method and the ZipCrypto check byte.
    pub encryption: Option<(&'m EncryptionMethod, u8)>,
}

/// Result of a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineOutput {
    /// Bytes read from the source.
    pub bytes_in: u64,
    /// Bytes seen by the count stage, if the pipeline has one.
    pub bytes_out: Option<u64>,
    /// CRC-32 from the checksum stage, if the pipeline has one.
    pub crc32: Option<u32>,
}

/// A buffered chain of stages.
#[derive(Debug)]
pub struct Pipeline<'a> {
    stages: Vec<Stage<'a>>,
    buffer_size: usize,
    bytes_in: u64,
    scratch: Vec<u8>,
}

impl<'a> Pipeline<'a> {
    /// Creates an empty pipeline reading `buffer_size` bytes at a time.
    pub fn new(buffer_size: usize) -> Self {
        Self {
            stages: Vec::new(),
            buffer_size: buffer_size.max(1),
            bytes_in: 0,
            scratch: Vec::new(),
        }
    }

    /// Appends a stage.
    pub fn with_stage(mut self, stage: Stage<'a>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Builds the write-side chain for `plan`, mirroring into `sink` if given.
    pub fn for_write(
        buffer_size: usize,
        plan: WritePlan<'_>,
        sink: Option<&'a mut dyn Write>,
    ) -> Result<Self> {
        let mut pipeline = Self::new(buffer_size);
        if plan.checksum {
            pipeline = pipeline.with_stage(Stage::Checksum(ChecksumStage::new()));
        }
        if let Some(level) = plan.compression_level {
            pipeline = pipeline.with_stage(Stage::Compress(Compressor::new(level)?));
        }
        if let Some((method, check_byte)) = plan.encryption {
            pipeline = pipeline.with_stage(Stage::Encrypt(Encryptor::new(method, check_byte)?));
        }
        if let Some(sink) = sink {
            pipeline = pipeline.with_stage(Stage::Mirror(MirrorStage::new(sink)));
        }
        Ok(pipeline.with_stage(Stage::Count(CountStage::new())))
    }

    /// Builds the read-side chain, mirroring plaintext into `sink` if given.
    pub fn for_read(
        buffer_size: usize,
        decryptor: Option<Decryptor>,
        decompress: bool,
        sink: Option<&'a mut dyn Write>,
    ) -> Result<Self> {
        let mut pipeline = Self::new(buffer_size);
        if let Some(decryptor) = decryptor {
            pipeline = pipeline.with_stage(Stage::Decrypt(decryptor));
        }
        if decompress {
            pipeline = pipeline.with_stage(Stage::Decompress(Decompressor::new()?));
        }
        pipeline = pipeline.with_stage(Stage::Checksum(ChecksumStage::new()));
        if let Some(sink) = sink {
            pipeline = pipeline.with_stage(Stage::Mirror(MirrorStage::new(sink)));
        }
        Ok(pipeline.with_stage(Stage::Count(CountStage::new())))
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(Stage::name).collect()
    }

    /// Feeds one chunk through every stage.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<()> {
        self.bytes_in += chunk.len() as u64;
        push_through(&mut self.stages, chunk.to_vec(), &mut self.scratch)
    }

    /// Flushes every stage in order and returns the results.
    pub fn finish(mut self) -> Result<PipelineOutput> {
        for i in 0..self.stages.len() {
            let mut tail = Vec::new();
            self.stages[i].finish(&mut tail)?;
            let (_, downstream) = self.stages.split_at_mut(i + 1);
            push_through(downstream, tail, &mut self.scratch)?;
        }
        let output = self.output();
        trace!(
            "pipeline [{}] done: {} bytes in, {:?} out",
            self.stage_names().join(" -> "),
            output.bytes_in,
            output.bytes_out
        );
        Ok(output)
    }

    /// Streams `source` through the pipeline and finishes it.
    pub fn run(mut self, source: Source<'_>) -> Result<PipelineOutput> {
        let mut reader = source.open()?;
        let mut buffer = vec![0u8; self.buffer_size];
        loop {
            let n = read_chunk(&mut reader, &mut buffer)?;
            if n == 0 {
                break;
            }
            self.feed(&buffer[..n])?;
        }
        self.finish()
    }

    fn output(&self) -> PipelineOutput {
        let crc32 = self.stages.iter().find_map(|s| match s {
            Stage::Checksum(c) => Some(c.value()),
            _ => None,
        });
        let bytes_out = self.stages.iter().rev().find_map(|s| match s {
            Stage::Count(c) => Some(c.value()),
            _ => None,
        });
        PipelineOutput {
            bytes_in: self.bytes_in,
            bytes_out,
            crc32,
        }
    }
}

fn push_through(stages: &mut [Stage<'_>], mut data: Vec<u8>, scratch: &mut Vec<u8>) -> Result<()> {
    for stage in stages {
        scratch.clear();
        stage.update(&data, scratch)?;
        std::mem::swap(&mut data, scratch);
    }
    Ok(())
}
