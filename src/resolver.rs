// ============================================================================
// Resource Resolution
// ============================================================================
//
// Components never hold a broker address. They hold LazyHandles that name
// a logical resource ("jms/myrabbit", "jms/test_queue") and resolve it on
// first use through a ResourceResolver. Resolution is deferred so the relay
// can start before the broker is reachable, and a failed resolution is not
// cached: the next use tries again.
//
// ============================================================================

use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::broker::{ConnectionFactory, InMemoryBroker, Queue, RedisConnectionFactory};
use crate::config::{BrokerConfig, BrokerKind};
use crate::error::{RelayError, RelayResult};

/// Kind of resource a logical name is expected to resolve to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    ConnectionFactory,
    Destination,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::ConnectionFactory => write!(f, "ConnectionFactory"),
            ResourceKind::Destination => write!(f, "Destination"),
        }
    }
}

/// A resolved resource
#[derive(Clone)]
pub enum Resource {
    ConnectionFactory(Arc<dyn ConnectionFactory>),
    Destination(Queue),
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::ConnectionFactory(_) => ResourceKind::ConnectionFactory,
            Resource::Destination(_) => ResourceKind::Destination,
        }
    }
}

/// Looks up resources by logical name
pub trait ResourceResolver: Send + Sync {
    /// Fails with `Binding` if `name` is unbound or bound to another kind
    fn resolve(&self, name: &str, kind: ResourceKind) -> RelayResult<Resource>;
}

fn kind_mismatch(name: &str, expected: ResourceKind, actual: ResourceKind) -> RelayError {
    RelayError::binding(format!(
        "'{}' is bound to a {}, expected {}",
        name, actual, expected
    ))
}

fn unbound(name: &str) -> RelayError {
    RelayError::binding(format!("name '{}' is not bound", name))
}

// ============================================================================
// ConfigResolver
// ============================================================================

/// Resolver backed by [`BrokerConfig`]
///
/// Binds exactly two names: the configured connection factory name and the
/// configured destination name.
pub struct ConfigResolver {
    config: BrokerConfig,
    // Shared so every resolution of a memory:// factory sees the same queues
    memory: Option<InMemoryBroker>,
}

impl ConfigResolver {
    pub fn new(config: BrokerConfig) -> Self {
        let memory = match config.kind {
            BrokerKind::Memory => Some(InMemoryBroker::new()),
            BrokerKind::Redis => None,
        };
        Self { config, memory }
    }

    /// In-process broker backing this resolver, if configured
    pub fn memory_broker(&self) -> Option<&InMemoryBroker> {
        self.memory.as_ref()
    }

    fn connection_factory(&self) -> RelayResult<Arc<dyn ConnectionFactory>> {
        match &self.memory {
            Some(broker) => Ok(Arc::new(broker.clone())),
            None => Ok(Arc::new(RedisConnectionFactory::new(&self.config)?)),
        }
    }
}

impl ResourceResolver for ConfigResolver {
    fn resolve(&self, name: &str, kind: ResourceKind) -> RelayResult<Resource> {
        let bound_kind = if name == self.config.connection_factory_name {
            ResourceKind::ConnectionFactory
        } else if name == self.config.destination_name {
            ResourceKind::Destination
        } else {
            return Err(unbound(name));
        };

        if bound_kind != kind {
            return Err(kind_mismatch(name, kind, bound_kind));
        }

        tracing::debug!(name = %name, kind = %kind, "Resolving resource");

        match kind {
            ResourceKind::ConnectionFactory => {
                Ok(Resource::ConnectionFactory(self.connection_factory()?))
            }
            ResourceKind::Destination => {
                Ok(Resource::Destination(Queue::new(self.config.queue_name.clone())))
            }
        }
    }
}

// ============================================================================
// StaticResolver
// ============================================================================

/// Resolver over a fixed set of bindings
#[derive(Clone, Default)]
pub struct StaticResolver {
    bindings: HashMap<String, Resource>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(mut self, name: impl Into<String>, resource: Resource) -> Self {
        self.bindings.insert(name.into(), resource);
        self
    }
}

impl ResourceResolver for StaticResolver {
    fn resolve(&self, name: &str, kind: ResourceKind) -> RelayResult<Resource> {
        let resource = self.bindings.get(name).ok_or_else(|| unbound(name))?;
        if resource.kind() != kind {
            return Err(kind_mismatch(name, kind, resource.kind()));
        }
        Ok(resource.clone())
    }
}

// ============================================================================
// LazyHandle
// ============================================================================

/// Types a [`LazyHandle`] can resolve to
pub trait FromResource: Sized {
    const KIND: ResourceKind;

    fn from_resource(resource: Resource) -> Option<Self>;
}

impl FromResource for Arc<dyn ConnectionFactory> {
    const KIND: ResourceKind = ResourceKind::ConnectionFactory;

    fn from_resource(resource: Resource) -> Option<Self> {
        match resource {
            Resource::ConnectionFactory(factory) => Some(factory),
            Resource::Destination(_) => None,
        }
    }
}

impl FromResource for Queue {
    const KIND: ResourceKind = ResourceKind::Destination;

    fn from_resource(resource: Resource) -> Option<Self> {
        match resource {
            Resource::Destination(queue) => Some(queue),
            Resource::ConnectionFactory(_) => None,
        }
    }
}

/// Deferred reference to a named resource
///
/// `resolve` yields the concrete target. Once resolved the target is fixed
/// for the life of the handle.
pub struct LazyHandle<T> {
    name: String,
    resolver: Arc<dyn ResourceResolver>,
    target: OnceCell<T>,
}

impl<T: FromResource + Clone> LazyHandle<T> {
    pub fn new(name: impl Into<String>, resolver: Arc<dyn ResourceResolver>) -> Self {
        Self {
            name: name.into(),
            resolver,
            target: OnceCell::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_resolved(&self) -> bool {
        self.target.get().is_some()
    }

    pub fn resolve(&self) -> RelayResult<T> {
        self.target
            .get_or_try_init(|| {
                let resource = self.resolver.resolve(&self.name, T::KIND)?;
                let actual = resource.kind();
                T::from_resource(resource)
                    .ok_or_else(|| kind_mismatch(&self.name, T::KIND, actual))
            })
            .cloned()
    }
}

impl<T> fmt::Debug for LazyHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyHandle")
            .field("name", &self.name)
            .field("resolved", &self.target.get().is_some())
            .finish()
    }
}

pub type FactoryHandle = LazyHandle<Arc<dyn ConnectionFactory>>;
pub type QueueHandle = LazyHandle<Queue>;
