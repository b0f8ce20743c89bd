/// The following diagram shows a very high level overview of what happens
/// when a deferred answer is first observed in a concrete context.
///
/// Only the seams are expanded: [`Llm`](crate::Llm) is the model backend and
/// [`CacheStore`](crate::CacheStore) the answer store, both replaceable by
/// the application.
#[cfg_attr(doc, aquamarine::aquamarine)]
/// ```mermaid
/// graph TB
///     App -- "Ai::new(prompt)" --> ai[Ai]
///     App -- "int() / check() / list() / resolve()" --> ai
///     subgraph llm-value
///         ai -- render {placeholders} --> template
///         ai -- lookup / store --> store>CacheStore]
///         ai -- prompt --> llm>Llm]
///         ai -- coerce --> value[Value]
///         store --> memory[MemoryCache]
///         store --> file[FileCache]
///         llm --> openai[OpenAiLlm]
///     end
///     openai --> api[(OpenAI API)]
///     value -- "arithmetic / comparison / iteration / Display" --> App
/// ```
///
/// Resolution is lazy and memoized: the rendered prompt plus the request
/// parameters form the cache key, and the model is called at most once per
/// distinct key per cache scope. The [`CacheScope`](crate::CacheScope)
/// decides which store backs a given [`Ai`](crate::Ai) value.
pub struct Diagram;
