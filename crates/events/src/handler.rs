/// Execute an aggregate command deterministically (no IO, no async).
///
/// Canonical decide-then-evolve step:
///
/// 1. **Decide**: `aggregate.handle(command)` returns events (pure).
/// 2. **Evolve**: each event is applied via `aggregate.apply(event)`.
///
/// The aggregate is mutated in place and the emitted events are returned so
/// the caller can persist/publish them. A failed decision leaves the
/// aggregate untouched.
pub fn execute<A>(aggregate: &mut A, command: &A::Command) -> Result<Vec<A::Event>, A::Error>
where
    A: ledgerly_core::Aggregate,
{
    let events = A::handle(aggregate, command)?;
    for ev in &events {
        A::apply(aggregate, ev);
    }
    Ok(events)
}
