//! Handler dispatch.
//!
//! A [`Handler`] is what the subscription registry stores: either a free
//! function or a method of some type `T`. Method handlers are delivered once
//! per live instance of `T` in its [`InstanceSet`].
//!
//! Synchronous callables run inline on the thread performing the mutation
//! and their errors propagate back to it. Asynchronous callables are spawned
//! through the tree's [`executor::Executor`] and never awaited by the
//! notifying mutation; their errors are logged.

use std::{fmt, pin::Pin, sync::Arc};

use handle_trait::Handle;

use crate::{Result, StateTree};

pub mod errors;
pub mod executor;
pub mod instances;

pub use errors::DispatchError;
pub use instances::{InstanceRegistry, InstanceSet};

/// Future returned by asynchronous handlers.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<()>> + Send + 'static>>;

/// A synchronous callable receiving the tree.
pub type SyncCallback = Arc<dyn Fn(&StateTree) -> Result<()> + Send + Sync>;

/// An asynchronous callable receiving a handle to the tree.
pub type AsyncCallback = Arc<dyn Fn(StateTree) -> HandlerFuture + Send + Sync>;

/// A single callable, bound to any receiver it needs.
#[derive(Clone)]
pub enum Callback {
    Sync(SyncCallback),
    Async(AsyncCallback),
}

/// A method handler: per-type callables plus the instances to call them on.
trait MethodTarget: Send + Sync {
    /// Name of the type whose instances receive the call.
    fn owner(&self) -> &'static str;

    /// One bound callable per live instance.
    fn receivers(&self) -> Vec<Callback>;
}

enum MethodCallback<T> {
    Sync(Arc<dyn Fn(&T, &StateTree) -> Result<()> + Send + Sync>),
    Async(Arc<dyn Fn(Arc<T>, StateTree) -> HandlerFuture + Send + Sync>),
}

struct Method<T> {
    instances: Arc<InstanceSet<T>>,
    callback: MethodCallback<T>,
}

impl<T: Send + Sync + 'static> MethodTarget for Method<T> {
    fn owner(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn receivers(&self) -> Vec<Callback> {
        self.instances
            .live()
            .into_iter()
            .map(|instance| match &self.callback {
                MethodCallback::Sync(f) => {
                    let f = Arc::clone(f);
                    Callback::Sync(Arc::new(move |tree: &StateTree| f(&instance, tree)))
                }
                MethodCallback::Async(f) => {
                    let f = Arc::clone(f);
                    Callback::Async(Arc::new(move |tree: StateTree| {
                        f(Arc::clone(&instance), tree)
                    }))
                }
            })
            .collect()
    }
}

enum Target {
    Function(Callback),
    Method(Arc<dyn MethodTarget>),
}

/// A subscribed callable.
pub struct Handler {
    name: String,
    target: Target,
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Handler");
        debug.field("name", &self.name);
        match &self.target {
            Target::Function(Callback::Sync(_)) => debug.field("kind", &"function"),
            Target::Function(Callback::Async(_)) => debug.field("kind", &"async function"),
            Target::Method(method) => debug.field("owner", &method.owner()),
        };
        debug.finish()
    }
}

impl Handler {
    /// A synchronous free function.
    pub fn function<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&StateTree) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            target: Target::Function(Callback::Sync(Arc::new(f))),
        }
    }

    /// An asynchronous free function. Each delivery spawns one task.
    pub fn function_async<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(StateTree) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let callback: AsyncCallback =
            Arc::new(move |tree: StateTree| -> HandlerFuture { Box::pin(f(tree)) });
        Self {
            name: name.into(),
            target: Target::Function(Callback::Async(callback)),
        }
    }

    /// A synchronous method, called once per live instance of `T`.
    pub fn method<T, F>(name: impl Into<String>, instances: Arc<InstanceSet<T>>, f: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&T, &StateTree) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            target: Target::Method(Arc::new(Method {
                instances,
                callback: MethodCallback::Sync(Arc::new(f)),
            })),
        }
    }

    /// An asynchronous method, spawned once per live instance of `T`.
    pub fn method_async<T, F>(
        name: impl Into<String>,
        instances: Arc<InstanceSet<T>>,
        f: F,
    ) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(Arc<T>, StateTree) -> HandlerFuture + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            target: Target::Method(Arc::new(Method {
                instances,
                callback: MethodCallback::Async(Arc::new(f)),
            })),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` for method handlers.
    pub fn is_method(&self) -> bool {
        matches!(self.target, Target::Method(_))
    }

    /// The owning type of a method handler.
    pub fn owner(&self) -> Option<&'static str> {
        match &self.target {
            Target::Method(method) => Some(method.owner()),
            Target::Function(_) => None,
        }
    }

    /// Invoke the handler: once for a function, once per live instance for
    /// a method.
    ///
    /// The first synchronous error stops delivery to the remaining
    /// instances and is returned.
    pub fn deliver(&self, tree: &StateTree) -> Result<()> {
        match &self.target {
            Target::Function(callback) => self.invoke(callback, tree),
            Target::Method(method) => {
                let receivers = method.receivers();
                tracing::trace!(
                    handler = %self.name,
                    owner = method.owner(),
                    instances = receivers.len(),
                    "Delivering method handler"
                );
                for callback in &receivers {
                    self.invoke(callback, tree)?;
                }
                Ok(())
            }
        }
    }

    fn invoke(&self, callback: &Callback, tree: &StateTree) -> Result<()> {
        match callback {
            Callback::Sync(f) => f(tree),
            Callback::Async(f) => {
                let future = f(tree.handle());
                let name = self.name.clone();
                tree.executor().spawn(&format!("handler '{}'", self.name), async move {
                    if let Err(e) = future.await {
                        tracing::error!(handler = %name, "Async handler failed: {e}");
                    }
                })
            }
        }
    }
}
