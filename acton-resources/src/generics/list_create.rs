//! List and create on one collection

use std::sync::Arc;

use super::base::{GenericResource, ResourceDescriptor};
use super::create::CreateCapability;
use super::list::ListCapability;
use crate::error::ContractError;
use crate::namespace::{Endpoint, Namespace, Resource, Verb};
use crate::repository::Model;

/// Resource answering both `GET` (list) and `POST` (create)
///
/// Each verb is composed from its own capability's settings, permission
/// checks included, so the endpoint never passes through
/// [`GenericResource::document`] as well.
#[derive(Debug, Clone)]
pub struct ListCreateResource<M: Model> {
    descriptor: ResourceDescriptor<M>,
}

impl<M: Model> ListCreateResource<M> {
    /// Check the descriptor and build the resource
    pub fn new(descriptor: ResourceDescriptor<M>) -> Result<Self, ContractError> {
        descriptor.model()?;
        descriptor.validate_pagination()?;
        Ok(Self { descriptor })
    }
}

impl<M: Model> GenericResource<M> for ListCreateResource<M> {
    fn descriptor(&self) -> &ResourceDescriptor<M> {
        &self.descriptor
    }
}

impl<M: Model> ListCapability<M> for ListCreateResource<M> {}

impl<M: Model> CreateCapability<M> for ListCreateResource<M> {}

impl<M: Model> Resource for ListCreateResource<M> {
    fn name(&self) -> &str {
        self.descriptor.name()
    }

    fn endpoint(self: Arc<Self>, namespace: &Namespace) -> Result<Endpoint, ContractError> {
        let get = Arc::clone(&self).list_handler(namespace);
        let post = self.create_handler(namespace);
        Ok(Endpoint::new()
            .with_handler(Verb::Get, get)
            .with_handler(Verb::Post, post)
            .with_permissions_applied())
    }
}
