/// Generates the lookup/removal pair every resource client exposes.
macro_rules! impl_client_methods {
    ($client_name:ident, $entity:ty, $error:ty, $entity_name_snake:ident) => {
        paste::paste! {
            impl $client_name {
                #[tracing::instrument(skip(self), fields(actor = %self.identity))]
                pub async fn [<get_ $entity_name_snake>](&self, id: String) -> Result<Option<$entity>, $error> {
                    tracing::debug!("Sending request");
                    self.inner.get(id).await
                }

                #[tracing::instrument(skip(self), fields(actor = %self.identity))]
                pub async fn [<delete_ $entity_name_snake>](&self, id: String) -> Result<$entity, $error> {
                    tracing::debug!("Sending request");
                    match self.inner.delete(id).await {
                        Ok(removed) => {
                            tracing::info!(entity = stringify!($entity_name_snake), "Deleted");
                            Ok(removed)
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, entity = stringify!($entity_name_snake), "Delete failed");
                            Err(e)
                        }
                    }
                }
            }
        }
    };
}
