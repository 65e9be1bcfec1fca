use colony_core::{ActError, Blackboard, Status, TickContext, WorldMut, WorldView};

/// A plain stepping function: one call, one status.
pub type StepFn<W> = Box<
    dyn FnMut(
        &TickContext,
        <W as WorldView>::Agent,
        &mut W,
        &mut Blackboard,
    ) -> Result<Status, ActError>,
>;

/// Adapts a stepping closure into an act node.
///
/// `make` is called on the first step after every initialize, so whatever progress the closure
/// captures starts over with each run.
pub struct Wrap<W>
where
    W: WorldMut + 'static,
{
    make: Box<dyn FnMut() -> StepFn<W>>,
    current: Option<StepFn<W>>,
}

impl<W> Wrap<W>
where
    W: WorldMut + 'static,
{
    pub fn new<F, S>(mut make: F) -> Self
    where
        F: FnMut() -> S + 'static,
        S: FnMut(&TickContext, W::Agent, &mut W, &mut Blackboard) -> Result<Status, ActError>
            + 'static,
    {
        Self {
            make: Box::new(move || Box::new(make()) as StepFn<W>),
            current: None,
        }
    }

    pub(crate) fn initialize(&mut self) {
        self.current = None;
    }

    pub(crate) fn tick(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) -> Result<Status, ActError> {
        let make = &mut self.make;
        let step = self.current.get_or_insert_with(|| make());
        step(ctx, agent, world, blackboard)
    }
}
