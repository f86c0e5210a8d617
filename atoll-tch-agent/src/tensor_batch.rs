use atoll_core::generic_replay_buffer::BatchBase;
use std::marker::PhantomData;
use tch::Tensor;

/// A batch arena backed by a [`Tensor`].
///
/// The internal buffer has the shape `[capacity, shape[1..]]`, where
/// `shape` is taken from the data pushed the first time via
/// [`TensorBatch::push`]. The first axis of the pushed data is the batch
/// size. The element type parameter `D` documents the dtype stored in
/// the arena (`u8` frames, `i64` actions); the dtype itself is inferred
/// from the pushed tensors.
pub struct TensorBatch<D> {
    buf: Option<Tensor>,
    capacity: i64,
    phantom: PhantomData<D>,
}

impl<D> TensorBatch<D> {
    /// Constructs a batch from a tensor, whose first axis is the batch
    /// size.
    pub fn from_tensor(t: Tensor) -> Self {
        let capacity = t.size()[0] as _;
        Self {
            buf: Some(t),
            capacity,
            phantom: PhantomData,
        }
    }
}

impl<D> BatchBase for TensorBatch<D>
where
    D: 'static + Copy + tch::kind::Element,
{
    fn new(capacity: usize) -> Self {
        Self {
            buf: None,
            capacity: capacity as _,
            phantom: PhantomData,
        }
    }

    /// Pushes given data at the index, wrapping modulo the capacity.
    ///
    /// If the internal buffer has not been initialized yet, it is created
    /// with the shape `[capacity, data.size()[1..]]` and the dtype of the
    /// given data.
    fn push(&mut self, index: usize, data: Self) {
        if data.buf.is_none() {
            return;
        }

        let data = data.buf.unwrap();
        let batch_size = data.size()[0];
        if batch_size == 0 {
            return;
        }

        if self.buf.is_none() {
            let mut shape = data.size();
            shape[0] = self.capacity;
            let kind = data.kind();
            let device = tch::Device::Cpu;
            self.buf = Some(Tensor::zeros(&shape[..], (kind, device)));
        }

        let index = index as i64;
        for i_ in 0..batch_size {
            let i = (i_ + index) % self.capacity;
            self.buf.as_ref().unwrap().get(i).copy_(&data.get(i_));
        }
    }

    fn sample(&self, ixs: &Vec<usize>) -> Self {
        let ixs = ixs.iter().map(|&ix| ix as i64).collect::<Vec<_>>();
        let batch_indexes = Tensor::from_slice(&ixs);
        let buf = Some(self.buf.as_ref().unwrap().index_select(0, &batch_indexes));
        Self {
            buf,
            capacity: ixs.len() as i64,
            phantom: PhantomData,
        }
    }
}

impl<D> From<TensorBatch<D>> for Tensor {
    fn from(b: TensorBatch<D>) -> Self {
        b.buf.expect("Buffer is not initialized")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::TryFrom;

    #[test]
    fn push_wraps_and_sample_gathers() {
        let mut arena = TensorBatch::<i64>::new(4);

        for v in 0..6i64 {
            let data = TensorBatch::from_tensor(Tensor::from_slice(&[v]).unsqueeze(0));
            arena.push(v as usize % 4, data);
        }

        // Entries 4 and 5 overwrote 0 and 1
        let sampled = arena.sample(&vec![0, 1, 2, 3]);
        let t: Tensor = sampled.into();
        let got = Vec::<i64>::try_from(&t.flatten(0, -1)).unwrap();
        assert_eq!(got, vec![4, 5, 2, 3]);
    }
}
