/*!
# Vercel DevKit - Stubs et Utilitaires pour Développement

Bibliothèque facilitant les tests du daemon vercel-agent avec:
- Stub HTTP de l'API Vercel (port éphémère, sans réseau externe)
- Injection d'erreurs par route (status, Retry-After)
- Compteurs de requêtes pour vérifier la pagination
- Builders de fixtures au format wire
*/

pub mod api_stub;
pub mod fixtures;

pub use api_stub::MockVercelApi;
