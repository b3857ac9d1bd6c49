/// Asserts that every agent sits in exactly one cell and that the cell
/// agrees with its cached coordinate.
#[macro_export]
macro_rules! assert_grid_consistent {
    ($world:expr) => {
        for agent in &$world.agents {
            let cells = $world.grid.locate(agent.id);
            assert_eq!(cells.len(), 1, "Agent {} is in cells {:?}", agent.id, cells);
            assert_eq!(
                cells[0],
                $world.grid.linear_index(agent.grid_coord),
                "Agent {} cached coordinate disagrees with its cell",
                agent.id
            );
        }
        assert_eq!($world.grid.member_count(), $world.agents.len());
    };
}

/// Asserts that two worlds are bit-identical replicas.
#[macro_export]
macro_rules! assert_same_replica {
    ($a:expr, $b:expr) => {
        assert_eq!($a.agents.len(), $b.agents.len(), "Population size mismatch");
        for (x, y) in $a.agents.iter().zip(&$b.agents) {
            assert_eq!(x.position, y.position, "Agent {} position differs", x.id);
            assert_eq!(x.velocity, y.velocity, "Agent {} velocity differs", x.id);
            assert_eq!(x.grid_coord, y.grid_coord, "Agent {} cell differs", x.id);
        }
        assert_eq!($a.grid.cells(), $b.grid.cells(), "Cell member lists differ");
        assert_eq!($a.fingerprint(), $b.fingerprint());
    };
}
