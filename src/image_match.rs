use k8s_openapi::api::core::v1::Container;

/// Determines whether at least one of the provided containers runs the given
/// image. The target is expected to be of the form `vendor/repo:tag` as
/// derived from a registry push event.
///
/// A container matches when its image is exactly the target or ends with the
/// target, which covers container specs that carry a registry host prefix the
/// push event does not (e.g. `registry.local/acme/app:v2` vs `acme/app:v2`).
/// No tag normalization is performed. Two unrelated registries hosting an
/// identically named `repo:tag` are indistinguishable here; that ambiguity is
/// an accepted limitation of suffix matching.
pub fn uses_image(target: &str, containers: &[Container]) -> bool {
    containers.iter().any(|container| {
        container
            .image
            .as_deref()
            .is_some_and(|image| image == target || image.ends_with(target))
    })
}
