//! Cells and the faces between them.

use mf_core::{CellId, FaceId, Frame, Vec3};
use mf_model::{Cell, CellState, Flux, Model, ModelError, ModelResult, StateSelector};

use crate::boundary::BoundaryKind;
use crate::error::{SimError, SimResult};

/// What lies on the far side of a face.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FaceSide {
    /// Another cell, by index.
    Interior(usize),
    Boundary(BoundaryKind),
}

/// A face between cell `left` and its `side`; `frame.normal` points away
/// from `left`.
#[derive(Clone, Debug)]
pub struct CellInterface {
    pub id: FaceId,
    pub left: usize,
    pub side: FaceSide,
    pub position: Vec3,
    pub surface: f64,
    pub frame: Frame,
}

#[derive(Debug)]
pub struct Mesh {
    pub cells: Vec<Cell>,
    pub interfaces: Vec<CellInterface>,
    /// Per cell: (neighbour cell, shared face) for every interior face.
    neighbours: Vec<Vec<(usize, usize)>>,
}

impl Mesh {
    pub fn new(cells: Vec<Cell>, interfaces: Vec<CellInterface>) -> SimResult<Self> {
        let n = cells.len();
        if n == 0 {
            return Err(SimError::invalid("mesh has no cells"));
        }
        let mut neighbours = vec![Vec::new(); n];
        for (f, face) in interfaces.iter().enumerate() {
            if face.left >= n {
                return Err(SimError::invalid(format!("face {} references cell {}", face.id, face.left)));
            }
            if !face.surface.is_finite() || face.surface <= 0.0 {
                return Err(SimError::invalid(format!("face {} has non-positive surface", face.id)));
            }
            match face.side {
                FaceSide::Interior(right) => {
                    if right >= n || right == face.left {
                        return Err(SimError::invalid(format!(
                            "face {} has invalid right cell {right}",
                            face.id
                        )));
                    }
                    neighbours[face.left].push((right, f));
                    neighbours[right].push((face.left, f));
                }
                FaceSide::Boundary(kind) => kind.validate()?,
            }
        }
        Ok(Self {
            cells,
            interfaces,
            neighbours,
        })
    }

    /// `n` uniform cells on [0, `length`] along x, with `init(x)` giving the
    /// state at each cell centre.
    pub fn line<F>(
        model: &Model,
        n: usize,
        length: f64,
        left: BoundaryKind,
        right: BoundaryKind,
        init: F,
    ) -> SimResult<Self>
    where
        F: Fn(f64) -> ModelResult<CellState>,
    {
        if n == 0 {
            return Err(SimError::invalid("line mesh needs at least one cell"));
        }
        if !length.is_finite() || length <= 0.0 {
            return Err(SimError::invalid("line mesh length must be positive"));
        }
        let dx = length / n as f64;
        let mut cells = Vec::with_capacity(n);
        for i in 0..n {
            let x = (i as f64 + 0.5) * dx;
            let id = CellId::from_index(i);
            let state = init(x).map_err(|e| e.at(id))?;
            cells.push(model.allocate_cell(id, Vec3::new(x, 0.0, 0.0), dx, dx, state)?);
        }
        let mut interfaces = Vec::with_capacity(n + 1);
        interfaces.push(CellInterface {
            id: FaceId::from_index(0),
            left: 0,
            side: FaceSide::Boundary(left),
            position: Vec3::zeros(),
            surface: 1.0,
            frame: Frame::x_axis().reversed(),
        });
        for i in 1..n {
            interfaces.push(CellInterface {
                id: FaceId::from_index(i),
                left: i - 1,
                side: FaceSide::Interior(i),
                position: Vec3::new(i as f64 * dx, 0.0, 0.0),
                surface: 1.0,
                frame: Frame::x_axis(),
            });
        }
        interfaces.push(CellInterface {
            id: FaceId::from_index(n),
            left: n - 1,
            side: FaceSide::Boundary(right),
            position: Vec3::new(length, 0.0, 0.0),
            surface: 1.0,
            frame: Frame::x_axis(),
        });
        Self::new(cells, interfaces)
    }

    pub fn n_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn neighbours(&self, cell: usize) -> &[(usize, usize)] {
        &self.neighbours[cell]
    }

    /// Volume-integrated conserved variables of the whole mesh.
    pub fn conserved_totals(&self, model: &Model, selector: StateSelector) -> Flux {
        let mut total = model.allocate_flux();
        let mut cons = model.allocate_flux();
        for cell in &self.cells {
            cons.build_cons(cell.state(selector));
            total.add_flux(&cons, cell.volume);
        }
        total
    }

    /// Re-derive every cell state from its primary variables.
    pub fn fulfill_states(&mut self, model: &Model) -> ModelResult<()> {
        for cell in &mut self.cells {
            let id = cell.id();
            model
                .fulfill_state_resume(&mut cell.state)
                .map_err(|e: ModelError| e.at(id))?;
        }
        Ok(())
    }
}
