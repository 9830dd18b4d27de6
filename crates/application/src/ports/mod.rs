mod resolver_engine;

pub use resolver_engine::{
    EngineAnswer, EngineCallback, EngineError, EngineFactory, EngineResult, ResolverEngine,
};
