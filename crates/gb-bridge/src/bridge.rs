use eyre::Result;
use gb_ssa::{JsonLoader, Program, ProgramLoader};
use gb_wire::{ByteBuffer, Handle};
use tracing::info;

use crate::callgraph::CallIndex;
use crate::config::BridgeConfig;
use crate::logging;
use crate::registry::HandleRegistry;

/// One translation session over a loaded program.
///
/// Every boundary operation is a method here. Handles handed out by one
/// session mean nothing to another.
#[derive(Debug)]
pub struct Bridge {
    pub(crate) program: Program,
    pub(crate) registry: HandleRegistry,
    pub(crate) buffer: ByteBuffer,
    pub(crate) calls: CallIndex,
    config: BridgeConfig,
}

impl Bridge {
    /// Loads a program document, installing logging on the way.
    pub fn initialize(source: &[u8], debug: bool) -> Result<Self> {
        let config = BridgeConfig::from_env().with_debug(debug);
        logging::init(config.debug);
        Self::with_loader(&JsonLoader, source, config)
    }

    pub fn with_loader(
        loader: &impl ProgramLoader,
        source: &[u8],
        config: BridgeConfig,
    ) -> Result<Self> {
        let program = loader.load(source)?;
        info!(
            package = %program.package,
            functions = program.functions().len(),
            types = program.types().len(),
            "program loaded"
        );
        Ok(Self::from_program(program, config))
    }

    pub fn from_program(program: Program, config: BridgeConfig) -> Self {
        let calls = CallIndex::build(&program);
        Self {
            buffer: ByteBuffer::with_capacity(config.buffer_capacity),
            registry: HandleRegistry::new(),
            program,
            calls,
            config,
        }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn registry(&self) -> &HandleRegistry {
        &self.registry
    }

    /// The record written by the last successful [`Bridge::step`].
    pub fn output(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    pub fn lookup_function(&mut self, name: &str) -> Handle {
        match self.program.lookup_function(name) {
            Some(func) => self.registry.function(func),
            None => Handle::NONE,
        }
    }
}
